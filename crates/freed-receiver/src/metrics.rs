//! 接收链路性能指标
//!
//! 原子计数器，接收线程写、任意线程读。持续的畸形流量表现为
//! `decode_errors` 上升而 `frames_decoded` 停滞——不会崩溃。

use std::sync::atomic::{AtomicU64, Ordering};

/// 接收器指标（原子计数器）
#[derive(Debug, Default)]
pub struct ReceiverMetrics {
    /// 收到的 UDP 数据报总数
    pub datagrams_received: AtomicU64,
    /// 解码成功并投递的帧数
    pub frames_decoded: AtomicU64,
    /// 解码失败（校验/命令字节/长度）的候选帧数
    pub decode_errors: AtomicU64,
    /// 重同步丢弃的字节数
    pub resync_bytes_skipped: AtomicU64,
}

impl ReceiverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前所有计数器的一致性快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            frames_decoded: self.frames_decoded.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            resync_bytes_skipped: self.resync_bytes_skipped.load(Ordering::Relaxed),
        }
    }
}

/// 指标快照（普通整数，可随意拷贝比较）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub datagrams_received: u64,
    pub frames_decoded: u64,
    pub decode_errors: u64,
    pub resync_bytes_skipped: u64,
}
