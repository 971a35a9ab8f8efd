//! 接收层错误类型定义

use crate::receiver::ReceiverState;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// 接收层错误类型
///
/// 单帧解码错误（`DecodeError`）不在此列：它们在接收循环内
/// 计数后吞掉，永远不会传播到调用方。
#[derive(Error, Debug)]
pub enum ReceiverError {
    /// 套接字绑定失败（地址/端口不可用），`start()` 直接失败
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// 套接字读取致命错误，接收器进入 `Failed` 状态
    #[error("Socket read error: {0}")]
    Socket(std::io::Error),

    /// 接收线程未在限定时间内退出
    #[error("Receiver thread did not stop within {timeout:?}")]
    ShutdownTimeout { timeout: Duration },

    /// 生命周期操作在错误的状态下被调用
    #[error("Cannot {operation} while receiver is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: ReceiverState,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReceiverError::Bind {
            addr: "127.0.0.1:40000".parse().unwrap(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("127.0.0.1:40000"));
        assert!(msg.contains("bind"));

        let err = ReceiverError::ShutdownTimeout {
            timeout: Duration::from_secs(2),
        };
        assert!(format!("{}", err).contains("2s"));

        let err = ReceiverError::InvalidState {
            operation: "start",
            state: ReceiverState::Running,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("start") && msg.contains("Running"));
    }

    #[test]
    fn test_bind_error_source_chain() {
        use std::error::Error as _;
        let err = ReceiverError::Bind {
            addr: "0.0.0.0:1".parse().unwrap(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
    }
}
