//! # FreeD Protocol
//!
//! FreeD 摄像机跟踪协议定义（纯解析层，无网络依赖）
//!
//! ## 模块
//!
//! - `constants`: 帧常量定义（命令字节、帧长、字段偏移）
//! - `camera`: D1 摄像机数据帧的解析与构建
//! - `framer`: 字节流分帧状态机（处理半包与重同步）
//!
//! ## 字节序
//!
//! 协议所有多字节字段均为大端（MSB 在前），角度与位置使用
//! 24-bit 二进制补码定点数。本模块提供了相应的转换工具函数。

pub mod camera;
pub mod constants;
pub mod framer;

// 重新导出常用类型
pub use camera::{FreedFrame, FreedScaling};
pub use constants::*;
pub use framer::StreamFramer;

use thiserror::Error;

/// 协议解析错误类型
///
/// 所有变体均为**单帧**错误：丢弃当前帧即可，不影响后续帧的解析。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Unrecognized message type: 0x{command:02X}")]
    UnrecognizedMessageType { command: u8 },

    #[error("Checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },
}

/// 大端 24-bit 补码转 i32
///
/// 高位字节先左移 24 位再算术右移 8 位，借符号扩展恢复负数。
pub fn bytes_to_i24_be(bytes: [u8; 3]) -> i32 {
    (((bytes[0] as i32) << 24) | ((bytes[1] as i32) << 16) | ((bytes[2] as i32) << 8)) >> 8
}

/// i32 转大端 24-bit 补码（取低 24 位）
pub fn i24_to_bytes_be(value: i32) -> [u8; 3] {
    let v = value & 0x00FF_FFFF;
    [(v >> 16) as u8, (v >> 8) as u8, v as u8]
}

/// 计算帧校验字节
///
/// 协议约定：整帧所有字节之和 ≡ 0 (mod 256)，
/// 因此校验字节为前面所有字节之和的补码。
pub fn checksum(bytes: &[u8]) -> u8 {
    0u8.wrapping_sub(bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_to_i24_be() {
        let value = bytes_to_i24_be([0x12, 0x34, 0x56]);
        assert_eq!(value, 0x123456);
    }

    #[test]
    fn test_bytes_to_i24_be_negative() {
        let value = bytes_to_i24_be([0xFF, 0xFF, 0xFF]);
        assert_eq!(value, -1);
    }

    #[test]
    fn test_bytes_to_i24_be_min_max() {
        assert_eq!(bytes_to_i24_be([0x7F, 0xFF, 0xFF]), 8_388_607);
        assert_eq!(bytes_to_i24_be([0x80, 0x00, 0x00]), -8_388_608);
    }

    #[test]
    fn test_i24_to_bytes_be() {
        assert_eq!(i24_to_bytes_be(0x123456), [0x12, 0x34, 0x56]);
    }

    #[test]
    fn test_i24_to_bytes_be_negative() {
        assert_eq!(i24_to_bytes_be(-1), [0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_roundtrip_i24() {
        for value in [-8_388_608, -65_536, -1, 0, 1, 42_000, 8_388_607] {
            assert_eq!(bytes_to_i24_be(i24_to_bytes_be(value)), value);
        }
    }

    #[test]
    fn test_checksum_makes_sum_zero() {
        let payload = [0xD1u8, 0x01, 0x23, 0x45, 0x67, 0x89];
        let ck = checksum(&payload);
        let total: u8 = payload.iter().fold(ck, |acc, b| acc.wrapping_add(*b));
        assert_eq!(total, 0);
    }

    #[test]
    fn test_checksum_empty() {
        assert_eq!(checksum(&[]), 0);
    }
}
