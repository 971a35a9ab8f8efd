//! 接收器配置与构建器

use crate::receiver::ReceiverService;
use crate::sink::PoseSink;
use crate::transform::MountConvention;
use freed_protocol::FreedScaling;
use std::net::SocketAddr;
use std::time::Duration;

/// 默认停止等待上限
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// 单个接收器的完整配置
///
/// 配置在 `start()` 之前固定，接收线程启动后不再变化。
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// UDP 绑定地址（端口 0 表示由系统分配，可用 `local_addr()` 查询）
    pub bind_addr: SocketAddr,
    /// 原始计数到工程单位的换算系数
    pub scaling: FreedScaling,
    /// 安装约定修正
    pub convention: MountConvention,
    /// `stop()` 等待接收线程退出的上限
    pub shutdown_timeout: Duration,
}

impl ReceiverConfig {
    /// 标准换算系数 + 默认安装约定
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            scaling: FreedScaling::default(),
            convention: MountConvention::default(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

/// `ReceiverService` 构建器
///
/// ## Example
///
/// ```no_run
/// use freed_receiver::{MountConvention, ReceiverBuilder, pose_channel};
///
/// let (sink, _samples) = pose_channel(64);
/// let receiver = ReceiverBuilder::new("0.0.0.0:40000".parse().unwrap())
///     .convention(MountConvention::neutral())
///     .build(Box::new(sink));
/// ```
#[derive(Debug, Clone)]
pub struct ReceiverBuilder {
    config: ReceiverConfig,
}

impl ReceiverBuilder {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            config: ReceiverConfig::new(bind_addr),
        }
    }

    /// 覆盖换算系数（非标准跟踪器）
    pub fn scaling(mut self, scaling: FreedScaling) -> Self {
        self.config.scaling = scaling;
        self
    }

    /// 覆盖安装约定
    pub fn convention(mut self, convention: MountConvention) -> Self {
        self.config.convention = convention;
        self
    }

    /// 覆盖停止等待上限
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// 绑定 sink，产出处于 `Created` 状态的接收器
    pub fn build(self, sink: Box<dyn PoseSink>) -> ReceiverService {
        ReceiverService::new(self.config, sink)
    }
}
