//! send 子命令：发送合成测试帧
//!
//! 联调接收端时不需要真实跟踪器：本命令按固定频率发送编码好的
//! D1 帧，姿态可以静止，也可以让 pan 匀速扫描。

use anyhow::{Context, Result};
use clap::Args;
use freed_protocol::{FreedFrame, FreedScaling};
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};
use tracing::info;

/// 发送命令参数
#[derive(Args, Debug)]
pub struct SendCommand {
    /// 目标地址
    #[arg(short, long)]
    target: SocketAddr,

    /// 发送频率（Hz）
    #[arg(short, long, default_value_t = 50)]
    rate: u32,

    /// 发送帧数（0 表示持续发送直到 Ctrl-C）
    #[arg(short, long, default_value_t = 0)]
    count: u64,

    /// 摄像机 ID
    #[arg(long, default_value_t = 1)]
    camera_id: u8,

    /// pan 角（度）
    #[arg(long, default_value_t = 0.0)]
    pan: f64,

    /// tilt 角（度）
    #[arg(long, default_value_t = 0.0)]
    tilt: f64,

    /// roll 角（度）
    #[arg(long, default_value_t = 0.0)]
    roll: f64,

    /// X 位置（毫米）
    #[arg(long, default_value_t = 0.0)]
    x: f64,

    /// Y 位置（毫米）
    #[arg(long, default_value_t = 0.0)]
    y: f64,

    /// Z 位置（毫米）
    #[arg(long, default_value_t = 0.0)]
    z: f64,

    /// zoom 编码器计数
    #[arg(long, default_value_t = 0.0)]
    zoom: f64,

    /// focus 编码器计数
    #[arg(long, default_value_t = 0.0)]
    focus: f64,

    /// pan 扫描速度（度/秒，0 表示静止姿态）
    #[arg(long, default_value_t = 0.0)]
    sweep: f64,
}

impl SendCommand {
    pub fn execute(self) -> Result<()> {
        anyhow::ensure!(self.rate > 0, "rate must be positive");

        let socket = UdpSocket::bind("0.0.0.0:0").context("Failed to bind sender socket")?;
        let scaling = FreedScaling::default();
        let interval = Duration::from_secs_f64(1.0 / self.rate as f64);
        info!("sending to {} at {} Hz", self.target, self.rate);

        let begin = Instant::now();
        let mut sent: u64 = 0;
        loop {
            let elapsed = begin.elapsed().as_secs_f64();
            let frame = FreedFrame {
                camera_id: self.camera_id,
                pan_deg: self.pan + self.sweep * elapsed,
                tilt_deg: self.tilt,
                roll_deg: self.roll,
                x_mm: self.x,
                y_mm: self.y,
                z_mm: self.z,
                zoom: self.zoom,
                focus: self.focus,
                checksum: 0,
            };
            socket
                .send_to(&frame.encode(&scaling), self.target)
                .context("Failed to send frame")?;
            sent += 1;
            if self.count > 0 && sent >= self.count {
                break;
            }
            std::thread::sleep(interval);
        }

        println!("sent {} frames to {}", sent, self.target);
        Ok(())
    }
}
