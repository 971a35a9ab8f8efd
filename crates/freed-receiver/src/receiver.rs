//! 接收器生命周期管理
//!
//! 对外的 `ReceiverService` 结构体，封装套接字、后台接收线程
//! 和状态机。状态转移：
//!
//! ```text
//! Created --start()--> Running --stop()--> Stopping --> Stopped
//!    |                    |                    |
//!    +---stop()---------> |                    +--join 超时--> Failed
//!    （直接 Stopped）      |
//!                         +--致命套接字错误--> Failed --stop()--> Stopped
//! ```

use crate::config::ReceiverConfig;
use crate::error::ReceiverError;
use crate::metrics::{MetricsSnapshot, ReceiverMetrics};
use crate::pipeline::{TOKEN_SOCKET, TOKEN_WAKE, rx_loop};
use crate::sink::PoseSink;
use mio::net::UdpSocket;
use mio::{Interest, Poll, Waker};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{error, info, warn};

/// Extension trait for timeout-capable thread joins
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()>;
}

impl<T: Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()> {
        use std::sync::mpsc;

        // Create a channel for signaling completion
        let (tx, rx) = mpsc::channel();

        // Spawn a watchdog thread that joins the target thread
        std::thread::spawn(move || {
            let result = self.join();
            // Send result (ignore send errors - receiver may have timed out)
            let _ = tx.send(result);
        });

        // Block with timeout - no busy waiting!
        match rx.recv_timeout(timeout) {
            Ok(join_result) => join_result.map(|_| ()),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // Timeout: watchdog thread continues running
                // This is acceptable - OS will clean up on process exit
                Err(Box::new(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "thread join timed out",
                )))
            },
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "watchdog thread disappeared",
            ))),
        }
    }
}

/// 接收器生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    /// 已构建，尚未绑定套接字
    Created,
    /// 后台线程运行中
    Running,
    /// `stop()` 已发起，等待线程退出
    Stopping,
    /// 已停止（终态之一，不可重启）
    Stopped,
    /// 致命套接字错误导致接收线程退出
    Failed,
}

/// 状态查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverStatus {
    pub state: ReceiverState,
    /// 最近一次致命错误的描述（仅 `Failed` 后有值）
    pub last_error: Option<String>,
}

/// 状态单元：调用方线程与接收线程共享
///
/// 接收线程只在致命错误时写入（`fail`），其余转移都由
/// 调用方线程驱动。互斥锁保证 state 与 last_error 一起更新。
pub(crate) struct StatusCell {
    inner: Mutex<ReceiverStatus>,
}

impl StatusCell {
    fn new() -> Self {
        Self {
            inner: Mutex::new(ReceiverStatus {
                state: ReceiverState::Created,
                last_error: None,
            }),
        }
    }

    fn state(&self) -> ReceiverState {
        self.inner.lock().state
    }

    fn set_state(&self, state: ReceiverState) {
        self.inner.lock().state = state;
    }

    /// 进入 `Failed` 并记录错误描述（接收线程调用）
    pub(crate) fn fail(&self, message: String) {
        let mut guard = self.inner.lock();
        guard.state = ReceiverState::Failed;
        guard.last_error = Some(message);
    }

    fn snapshot(&self) -> ReceiverStatus {
        self.inner.lock().clone()
    }
}

/// 单个 FreeD 跟踪器的接收服务
///
/// 由 [`ReceiverBuilder`](crate::ReceiverBuilder) 构建。一个实例
/// 对应一个 UDP 套接字和一条后台线程；多路跟踪时每个源各建一个。
pub struct ReceiverService {
    config: ReceiverConfig,
    // start() 时移交给接收线程，Created 状态下必有值
    sink: Option<Box<dyn PoseSink>>,
    status: Arc<StatusCell>,
    metrics: Arc<ReceiverMetrics>,
    is_running: Arc<AtomicBool>,
    waker: Option<Waker>,
    rx_thread: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl ReceiverService {
    pub(crate) fn new(config: ReceiverConfig, sink: Box<dyn PoseSink>) -> Self {
        Self {
            config,
            sink: Some(sink),
            status: Arc::new(StatusCell::new()),
            metrics: Arc::new(ReceiverMetrics::new()),
            is_running: Arc::new(AtomicBool::new(false)),
            waker: None,
            rx_thread: None,
            local_addr: None,
        }
    }

    /// 绑定套接字并启动后台接收线程
    ///
    /// 只允许从 `Created` 状态调用一次；绑定失败时状态保持
    /// `Created`，可换地址重建后再试。
    pub fn start(&mut self) -> Result<(), ReceiverError> {
        let state = self.status.state();
        if state != ReceiverState::Created {
            return Err(ReceiverError::InvalidState {
                operation: "start",
                state,
            });
        }

        let mut socket = UdpSocket::bind(self.config.bind_addr).map_err(|source| {
            ReceiverError::Bind {
                addr: self.config.bind_addr,
                source,
            }
        })?;
        let local_addr = socket.local_addr().map_err(ReceiverError::Socket)?;

        let poll = Poll::new().map_err(ReceiverError::Socket)?;
        poll.registry()
            .register(&mut socket, TOKEN_SOCKET, Interest::READABLE)
            .map_err(ReceiverError::Socket)?;
        // Waker 让 stop() 能打断 poll 的无限期阻塞
        let waker = Waker::new(poll.registry(), TOKEN_WAKE).map_err(ReceiverError::Socket)?;

        // 状态机保证：Created 状态下 sink 尚未被移交
        let Some(sink) = self.sink.take() else {
            return Err(ReceiverError::InvalidState {
                operation: "start",
                state,
            });
        };

        self.is_running.store(true, Ordering::Release);
        self.status.set_state(ReceiverState::Running);

        let scaling = self.config.scaling;
        let convention = self.config.convention;
        let status = self.status.clone();
        let metrics = self.metrics.clone();
        let is_running = self.is_running.clone();

        let handle = std::thread::Builder::new()
            .name(format!("freed-rx-{}", local_addr.port()))
            .spawn(move || {
                rx_loop(poll, socket, scaling, convention, sink, status, metrics, is_running)
            })
            .map_err(|e| {
                self.is_running.store(false, Ordering::Release);
                self.status.fail(format!("failed to spawn rx thread: {}", e));
                ReceiverError::Socket(e)
            })?;

        info!("FreeD receiver listening on {}", local_addr);
        self.local_addr = Some(local_addr);
        self.waker = Some(waker);
        self.rx_thread = Some(handle);
        Ok(())
    }

    /// 停止接收线程（幂等）
    ///
    /// - `Created`：直接进入 `Stopped`，不涉及线程
    /// - `Running` / `Failed`：置运行标志、唤醒线程、限时等待退出；
    ///   线程未在限时内确认退出时返回 `ShutdownTimeout` 并进入
    ///   `Failed`（错误留在 `status()` 里，可再次 `stop()` 收尾）
    /// - `Stopped` / `Stopping`：no-op
    pub fn stop(&mut self) -> Result<(), ReceiverError> {
        match self.status.state() {
            ReceiverState::Created => {
                self.status.set_state(ReceiverState::Stopped);
                return Ok(());
            },
            ReceiverState::Stopped | ReceiverState::Stopping => return Ok(()),
            ReceiverState::Running | ReceiverState::Failed => {},
        }

        self.status.set_state(ReceiverState::Stopping);

        // 设置运行标志为 false，通知接收线程退出
        // 使用 Release 确保所有之前的写入对接收线程可见
        self.is_running.store(false, Ordering::Release);

        // 唤醒可能阻塞在 poll 上的接收线程
        if let Some(waker) = &self.waker
            && let Err(e) = waker.wake()
        {
            warn!("Failed to wake RX thread: {}", e);
        }

        if let Some(handle) = self.rx_thread.take()
            && handle.join_timeout(self.config.shutdown_timeout).is_err()
        {
            error!(
                "RX thread panicked or failed to shut down within {:?}",
                self.config.shutdown_timeout
            );
            // 线程未确认退出：进入 Failed，保留错误供 status() 查询；
            // 再次 stop() 可把状态收尾到 Stopped
            self.status.fail(format!(
                "shutdown timed out after {:?}",
                self.config.shutdown_timeout
            ));
            return Err(ReceiverError::ShutdownTimeout {
                timeout: self.config.shutdown_timeout,
            });
        }

        self.status.set_state(ReceiverState::Stopped);
        info!("FreeD receiver stopped");
        Ok(())
    }

    /// 当前状态与最近致命错误
    pub fn status(&self) -> ReceiverStatus {
        self.status.snapshot()
    }

    /// 当前生命周期状态
    pub fn state(&self) -> ReceiverState {
        self.status.state()
    }

    /// 指标快照
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// 套接字实际绑定到的地址（`start()` 成功之后有值）
    ///
    /// 绑定端口 0 时用它拿到系统分配的端口。
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

impl Drop for ReceiverService {
    fn drop(&mut self) {
        if matches!(
            self.status.state(),
            ReceiverState::Running | ReceiverState::Failed
        ) && let Err(e) = self.stop()
        {
            error!("Failed to stop receiver on drop: {}", e);
        }
    }
}
