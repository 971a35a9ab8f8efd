//! listen 子命令：监听一路或多路跟踪器并打印姿态采样

use anyhow::{Context, Result};
use clap::Args;
use freed_receiver::{
    MountConvention, PoseSample, ReceiverBuilder, ReceiverService, pose_channel,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

/// 监听命令参数
#[derive(Args, Debug)]
pub struct ListenCommand {
    /// 监听地址，可重复指定以同时接收多路跟踪器
    #[arg(short, long, required = true)]
    bind: Vec<SocketAddr>,

    /// 每路接收器的采样缓冲大小（满时丢最旧）
    #[arg(long, default_value_t = 64)]
    capacity: usize,

    /// 不做安装约定修正，按跟踪器原生约定输出
    #[arg(long)]
    raw: bool,

    /// 退出时打印每路接收器的统计
    #[arg(long, default_value_t = true)]
    stats: bool,
}

impl ListenCommand {
    pub fn execute(self) -> Result<()> {
        let convention = if self.raw {
            MountConvention::neutral()
        } else {
            MountConvention::default()
        };

        // 每个地址一个独立接收器，各占一条后台线程
        let mut receivers: Vec<ReceiverService> = Vec::new();
        let mut channels = Vec::new();
        for addr in &self.bind {
            let (sink, samples) = pose_channel(self.capacity);
            let mut receiver = ReceiverBuilder::new(*addr)
                .convention(convention)
                .build(Box::new(sink));
            receiver
                .start()
                .with_context(|| format!("Failed to start receiver on {}", addr))?;
            info!("listening on {}", receiver.local_addr().unwrap_or(*addr));
            receivers.push(receiver);
            channels.push(samples);
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_flag = running.clone();
        ctrlc::set_handler(move || {
            running_flag.store(false, Ordering::Release);
        })
        .context("Failed to install Ctrl-C handler")?;

        println!("Press Ctrl-C to stop.");
        while running.load(Ordering::Acquire) {
            let mut idle = true;
            for (index, samples) in channels.iter().enumerate() {
                while let Ok(sample) = samples.try_recv() {
                    idle = false;
                    print_sample(self.bind[index], &sample);
                }
            }
            if idle {
                std::thread::sleep(Duration::from_millis(5));
            }
        }

        for mut receiver in receivers {
            let addr = receiver.local_addr();
            receiver.stop()?;
            if self.stats {
                let metrics = receiver.metrics();
                println!(
                    "{}: {} datagrams, {} frames, {} decode errors, {} resync bytes",
                    addr.map(|a| a.to_string()).unwrap_or_default(),
                    metrics.datagrams_received,
                    metrics.frames_decoded,
                    metrics.decode_errors,
                    metrics.resync_bytes_skipped,
                );
            }
        }
        Ok(())
    }
}

fn print_sample(source: SocketAddr, sample: &PoseSample) {
    let (roll, pitch, yaw) = sample.orientation.euler_angles();
    println!(
        "[{}] cam {:>3} | pos ({:+8.3}, {:+8.3}, {:+8.3}) m | rpy ({:+7.2}, {:+7.2}, {:+7.2}) deg | zoom {:.0} focus {:.0}",
        source,
        sample.source_id,
        sample.position.x,
        sample.position.y,
        sample.position.z,
        roll.to_degrees(),
        pitch.to_degrees(),
        yaw.to_degrees(),
        sample.zoom,
        sample.focus,
    );
}
