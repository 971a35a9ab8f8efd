//! # FreeD Receiver
//!
//! FreeD 跟踪数据的采集层：每个物理跟踪器对应一个 `ReceiverService`，
//! 独占一个 UDP 套接字和一条后台接收线程。线程内完成
//! 分帧 → 解码 → 坐标变换，然后把 `PoseSample` 同步交给 sink。
//!
//! ## 线程模型
//!
//! - 每个接收器一条专属后台线程，接收器之间无共享可变状态
//! - 后台线程只在 `Poll::poll` 上阻塞；`stop()` 通过 `Waker`
//!   强制唤醒，而不是依赖超时轮询
//! - sink 在接收线程上同步调用，消费侧自行决定排队策略
//!   （推荐 [`pose_channel`] 或 [`SharedPose`]）
//!
//! ## Example
//!
//! ```no_run
//! use freed_receiver::{ReceiverBuilder, pose_channel};
//!
//! let (sink, samples) = pose_channel(64);
//! let mut receiver = ReceiverBuilder::new("0.0.0.0:40000".parse().unwrap())
//!     .build(Box::new(sink));
//! receiver.start().unwrap();
//!
//! let sample = samples.recv().unwrap();
//! println!("camera {} at {:?}", sample.source_id, sample.position);
//!
//! receiver.stop().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub(crate) mod pipeline;
pub mod receiver;
pub mod sink;
pub mod transform;

pub use config::{ReceiverBuilder, ReceiverConfig};
pub use error::ReceiverError;
pub use metrics::{MetricsSnapshot, ReceiverMetrics};
pub use receiver::{ReceiverService, ReceiverState, ReceiverStatus};
pub use sink::{PoseChannel, PoseReceiver, PoseSink, SharedPose, pose_channel};
pub use transform::{MountConvention, PoseSample, transform};

// 重新导出协议层常用类型
pub use freed_protocol::{DecodeError, FreedFrame, FreedScaling};
