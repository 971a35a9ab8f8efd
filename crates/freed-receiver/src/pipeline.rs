//! 接收循环
//!
//! 后台线程的主体：在 `Poll::poll` 上阻塞等待套接字可读或
//! `Waker` 唤醒，醒来后把数据报喂给分帧器，逐个候选帧解码、
//! 变换并投递给 sink。
//!
//! 错误分级：
//! - 单帧解码错误计数后继续——畸形数据报不能中断整个会话
//! - 套接字致命错误记录到状态单元，接收器进入 `Failed` 并退出循环

use crate::metrics::ReceiverMetrics;
use crate::receiver::StatusCell;
use crate::sink::PoseSink;
use crate::transform::{MountConvention, transform};
use freed_protocol::{FreedFrame, FreedScaling, StreamFramer};
use mio::net::UdpSocket;
use mio::{Events, Poll, Token};
use std::io::ErrorKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, trace};

/// 套接字可读事件的 token
pub(crate) const TOKEN_SOCKET: Token = Token(0);
/// `stop()` 唤醒事件的 token
pub(crate) const TOKEN_WAKE: Token = Token(1);

/// 单个数据报的最大长度
///
/// FreeD 帧只有 29 字节，但串口转 UDP 网桥可能把多帧打进
/// 一个数据报，留出余量。
const RECV_BUF_LEN: usize = 2048;

/// RX 线程主循环
///
/// # 参数
/// - `poll` / `socket`: 已注册 `TOKEN_SOCKET` 的非阻塞套接字
/// - `sink`: 采样下游（在本线程上同步调用）
/// - `status`: 状态单元（致命错误时写入 `Failed`）
/// - `is_running`: 运行标志（`stop()` 置 false 后经 Waker 唤醒本线程）
pub(crate) fn rx_loop(
    mut poll: Poll,
    socket: UdpSocket,
    scaling: FreedScaling,
    convention: MountConvention,
    mut sink: Box<dyn PoseSink>,
    status: Arc<StatusCell>,
    metrics: Arc<ReceiverMetrics>,
    is_running: Arc<AtomicBool>,
) {
    let mut framer = StreamFramer::new();
    let mut events = Events::with_capacity(8);
    let mut buf = [0u8; RECV_BUF_LEN];

    loop {
        // 检查运行标志
        // Acquire: 看到 false 时必须同时看到 stop() 之前的所有写入
        if !is_running.load(Ordering::Acquire) {
            trace!("rx thread: is_running flag is false, exiting");
            break;
        }

        // ============================================================
        // 1. 阻塞等待：套接字可读，或 stop() 的 Waker 唤醒
        // ============================================================
        if let Err(e) = poll.poll(&mut events, None) {
            if e.kind() == ErrorKind::Interrupted {
                continue;
            }
            error!("rx thread: poll error: {}", e);
            status.fail(format!("poll error: {}", e));
            is_running.store(false, Ordering::Release);
            break;
        }

        // Waker 事件不携带数据，循环头部的标志检查会让线程退出；
        // 这里只需要把套接字读空。

        // ============================================================
        // 2. 读空套接字（非阻塞，直到 WouldBlock）
        // ============================================================
        loop {
            let len = match socket.recv_from(&mut buf) {
                Ok((len, _peer)) => len,
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    // 致命套接字错误：进入 Failed，留给 status 查询
                    error!("rx thread: fatal socket error: {}", e);
                    status.fail(format!("socket read error: {}", e));
                    is_running.store(false, Ordering::Release);
                    return;
                },
            };

            metrics.datagrams_received.fetch_add(1, Ordering::Relaxed);

            // ============================================================
            // 3. 分帧 → 解码 → 变换 → 投递
            // ============================================================
            framer.push(&buf[..len]);
            while let Some(candidate) = framer.next_frame() {
                match FreedFrame::decode(&candidate, &scaling) {
                    Ok(frame) => {
                        metrics.frames_decoded.fetch_add(1, Ordering::Relaxed);
                        trace!(
                            "camera {}: pan={:.3} tilt={:.3} roll={:.3}",
                            frame.camera_id, frame.pan_deg, frame.tilt_deg, frame.roll_deg
                        );
                        sink.deliver(transform(&frame, &convention));
                    },
                    Err(e) => {
                        // 畸形帧：计数后继续，绝不让单帧错误终止接收
                        metrics.decode_errors.fetch_add(1, Ordering::Relaxed);
                        trace!("rx thread: dropping malformed frame: {}", e);
                    },
                }
            }

            // 分帧器内部统计重同步丢弃量，这里同步到指标
            // （单写者，store 即可）
            let skipped = framer.bytes_skipped();
            if skipped > 0 {
                metrics.resync_bytes_skipped.store(skipped, Ordering::Relaxed);
            }
        }

        if framer.buffered_len() > 0 {
            trace!(
                "rx thread: {} bytes of partial frame buffered across datagrams",
                framer.buffered_len()
            );
        }
    }

    trace!("rx thread: loop exited");
}
