//! 采样下游（sink）
//!
//! sink 在接收线程上被同步调用，因此不得无限阻塞——否则会
//! 饿死后续帧的投递。两个内置实现都满足这一点：
//!
//! - [`PoseChannel`]：有界 crossbeam 通道，满时丢最旧（latest wins）
//! - [`SharedPose`]：只保留最新采样的无锁单元，消费方按需轮询

use crate::transform::PoseSample;
use arc_swap::ArcSwapOption;
use crossbeam_channel::{
    Iter, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError, TrySendError, bounded,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// 姿态采样的下游接口
///
/// 实现必须是 `Send`（会被移动到接收线程），且 `deliver`
/// 不得无限阻塞。闭包可以直接用作 sink。
pub trait PoseSink: Send {
    fn deliver(&mut self, sample: PoseSample);
}

impl<F> PoseSink for F
where
    F: FnMut(PoseSample) + Send,
{
    fn deliver(&mut self, sample: PoseSample) {
        self(sample)
    }
}

/// 创建一对通道 sink 与消费端
///
/// 接收线程往 `PoseChannel` 推，消费线程从 [`PoseReceiver`] 拉，
/// 两侧速率解耦。`capacity` 为有界缓冲大小。
pub fn pose_channel(capacity: usize) -> (PoseChannel, PoseReceiver) {
    let (tx, rx) = bounded(capacity);
    let live = Arc::new(());
    let sink = PoseChannel {
        tx,
        rx: rx.clone(),
        live: Arc::downgrade(&live),
        dropped: Arc::new(AtomicU64::new(0)),
    };
    (sink, PoseReceiver { rx, _live: live })
}

/// 通道 sink 的消费端
///
/// 持有存活令牌：丢弃 `PoseReceiver` 后，sink 一侧会在下一次
/// 投递时观察到消费端已挂断，并开始静默丢弃。
pub struct PoseReceiver {
    rx: Receiver<PoseSample>,
    _live: Arc<()>,
}

impl PoseReceiver {
    /// 阻塞等待下一个采样
    pub fn recv(&self) -> Result<PoseSample, RecvError> {
        self.rx.recv()
    }

    /// 非阻塞取一个采样
    pub fn try_recv(&self) -> Result<PoseSample, TryRecvError> {
        self.rx.try_recv()
    }

    /// 限时等待下一个采样
    pub fn recv_timeout(&self, timeout: Duration) -> Result<PoseSample, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// 阻塞迭代采样流
    pub fn iter(&self) -> Iter<'_, PoseSample> {
        self.rx.iter()
    }

    /// 当前待消费的采样数
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// 有界通道 sink
///
/// 消费方跟不上时丢弃**最旧**的待处理采样：跟踪数据里
/// 新姿态总是比旧姿态有价值（消费方要的是"现在相机在哪"）。
pub struct PoseChannel {
    tx: Sender<PoseSample>,
    // crossbeam 通道是 MPMC 的，持有一个消费端用于满时弹出旧值；
    // 消费方是否还在由 live 令牌判断，不看通道本身
    rx: Receiver<PoseSample>,
    live: Weak<()>,
    dropped: Arc<AtomicU64>,
}

impl PoseChannel {
    /// 因通道满或消费端挂断而被丢弃的采样数
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// 丢弃计数器的共享句柄（可在把 sink 交给接收器之前克隆保留）
    pub fn dropped_handle(&self) -> Arc<AtomicU64> {
        self.dropped.clone()
    }
}

impl PoseSink for PoseChannel {
    fn deliver(&mut self, sample: PoseSample) {
        // 消费端已丢弃 PoseReceiver：计数丢弃，并清空残留缓冲
        if self.live.upgrade().is_none() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            while self.rx.try_recv().is_ok() {}
            return;
        }

        match self.tx.try_send(sample) {
            Ok(()) => {},
            Err(TrySendError::Full(sample)) => {
                // 弹出最旧的一个腾出位置；两次尝试之间消费方可能
                // 已经清空了通道，二次失败直接丢当前帧
                let _ = self.rx.try_recv();
                self.dropped.fetch_add(1, Ordering::Relaxed);
                let _ = self.tx.try_send(sample);
            },
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            },
        }
    }
}

/// 只保留最新采样的无锁单元
///
/// 对应"按自己的时钟轮询最新姿态"的消费方式：克隆一份留在
/// 消费线程，另一份装箱交给接收器。
#[derive(Clone, Default)]
pub struct SharedPose {
    cell: Arc<ArcSwapOption<PoseSample>>,
}

impl SharedPose {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取最新采样（尚未收到任何帧时为 `None`）
    pub fn latest(&self) -> Option<PoseSample> {
        self.cell.load_full().map(|arc| (*arc).clone())
    }
}

impl PoseSink for SharedPose {
    fn deliver(&mut self, sample: PoseSample) {
        self.cell.store(Some(Arc::new(sample)));
    }
}
