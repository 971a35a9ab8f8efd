//! D1 摄像机数据帧解析
//!
//! `decode` 是纯函数：字节块进、`FreedFrame` 或 `DecodeError` 出，
//! 无任何 I/O 或阻塞。校验失败的帧**永远不会**以数据形式出现——
//! `FreedFrame` 只能由校验通过的字节构建。

use crate::constants::*;
use crate::{DecodeError, bytes_to_i24_be, checksum, i24_to_bytes_be};

/// 定点刻度配置
///
/// FreeD 的三类定点字段各有一个"每单位 LSB 数"的刻度因子。
/// 默认值为标准 D1 常量；个别跟踪器厂商使用私有刻度，
/// 因此刻度是运行时配置而不是硬编码常量。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreedScaling {
    /// 角度字段：每度的 LSB 数
    pub angle_lsb_per_degree: f64,
    /// 位置字段：每毫米的 LSB 数
    pub position_lsb_per_mm: f64,
    /// zoom/focus 字段：每计数的 LSB 数
    pub lens_lsb_per_count: f64,
}

impl Default for FreedScaling {
    fn default() -> Self {
        Self {
            angle_lsb_per_degree: ANGLE_LSB_PER_DEGREE,
            position_lsb_per_mm: POSITION_LSB_PER_MM,
            lens_lsb_per_count: LENS_LSB_PER_COUNT,
        }
    }
}

/// 一条解码后的 D1 摄像机数据消息
///
/// 角度单位为度，位置单位为毫米（跟踪器原生约定），
/// zoom/focus 为镜头编码器计数。坐标系转换在上层完成。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreedFrame {
    /// 摄像机/单元 ID
    pub camera_id: u8,
    /// Pan（偏航角，度）
    pub pan_deg: f64,
    /// Tilt（俯仰角，度）
    pub tilt_deg: f64,
    /// Roll（横滚角，度）
    pub roll_deg: f64,
    /// 位置 X（毫米）
    pub x_mm: f64,
    /// 位置 Y（毫米）
    pub y_mm: f64,
    /// 位置 Z（毫米）
    pub z_mm: f64,
    /// Zoom 编码器计数
    pub zoom: f64,
    /// Focus 编码器计数
    pub focus: f64,
    /// 原始校验字节（解码时已验证通过）
    pub checksum: u8,
}

impl FreedFrame {
    /// 解码一个定长字节块
    ///
    /// # 错误
    /// - `DecodeError::InvalidLength`: 输入不是恰好 29 字节
    /// - `DecodeError::UnrecognizedMessageType`: 命令字节不是 0xD1
    /// - `DecodeError::ChecksumMismatch`: 整帧字节和 mod 256 不为零
    pub fn decode(bytes: &[u8], scaling: &FreedScaling) -> Result<Self, DecodeError> {
        if bytes.len() != FRAME_LEN {
            return Err(DecodeError::InvalidLength {
                expected: FRAME_LEN,
                actual: bytes.len(),
            });
        }

        if bytes[0] != MSG_CAMERA_DATA {
            return Err(DecodeError::UnrecognizedMessageType { command: bytes[0] });
        }

        let expected = checksum(&bytes[..OFFSET_CHECKSUM]);
        let actual = bytes[OFFSET_CHECKSUM];
        if expected != actual {
            return Err(DecodeError::ChecksumMismatch { expected, actual });
        }

        let field = |offset: usize| -> i32 {
            bytes_to_i24_be([bytes[offset], bytes[offset + 1], bytes[offset + 2]])
        };

        Ok(Self {
            camera_id: bytes[OFFSET_CAMERA_ID],
            pan_deg: field(OFFSET_PAN) as f64 / scaling.angle_lsb_per_degree,
            tilt_deg: field(OFFSET_TILT) as f64 / scaling.angle_lsb_per_degree,
            roll_deg: field(OFFSET_ROLL) as f64 / scaling.angle_lsb_per_degree,
            x_mm: field(OFFSET_POS_X) as f64 / scaling.position_lsb_per_mm,
            y_mm: field(OFFSET_POS_Y) as f64 / scaling.position_lsb_per_mm,
            z_mm: field(OFFSET_POS_Z) as f64 / scaling.position_lsb_per_mm,
            zoom: field(OFFSET_ZOOM) as f64 / scaling.lens_lsb_per_count,
            focus: field(OFFSET_FOCUS) as f64 / scaling.lens_lsb_per_count,
            checksum: actual,
        })
    }

    /// 编码为 29 字节线上格式（`decode` 的逆，误差不超过一个量化步长）
    ///
    /// 用于测试、模拟器和 CLI 的发包端，接收路径不依赖它。
    pub fn encode(&self, scaling: &FreedScaling) -> [u8; FRAME_LEN] {
        let mut buf = [0u8; FRAME_LEN];
        buf[0] = MSG_CAMERA_DATA;
        buf[OFFSET_CAMERA_ID] = self.camera_id;

        let mut put = |offset: usize, value: f64, lsb_per_unit: f64| {
            let raw = (value * lsb_per_unit).round().clamp(-8_388_608.0, 8_388_607.0) as i32;
            buf[offset..offset + 3].copy_from_slice(&i24_to_bytes_be(raw));
        };

        put(OFFSET_PAN, self.pan_deg, scaling.angle_lsb_per_degree);
        put(OFFSET_TILT, self.tilt_deg, scaling.angle_lsb_per_degree);
        put(OFFSET_ROLL, self.roll_deg, scaling.angle_lsb_per_degree);
        put(OFFSET_POS_X, self.x_mm, scaling.position_lsb_per_mm);
        put(OFFSET_POS_Y, self.y_mm, scaling.position_lsb_per_mm);
        put(OFFSET_POS_Z, self.z_mm, scaling.position_lsb_per_mm);
        put(OFFSET_ZOOM, self.zoom, scaling.lens_lsb_per_count);
        put(OFFSET_FOCUS, self.focus, scaling.lens_lsb_per_count);

        buf[OFFSET_CHECKSUM] = checksum(&buf[..OFFSET_CHECKSUM]);
        buf
    }
}
