//! 协议常量定义
//!
//! FreeD D1（camera position data）消息的固定布局。
//! 所有多字节字段均为大端 24-bit 补码定点数。

// ============================================================================
// Message Types
// ============================================================================

/// D1 摄像机数据消息的命令字节
pub const MSG_CAMERA_DATA: u8 = 0xD1;

// ============================================================================
// Frame Layout
// ============================================================================

/// 帧总长（字节）：1 命令 + 1 ID + 3×3 角度 + 3×3 位置 + 3 zoom + 3 focus
/// + 2 备用 + 1 校验
pub const FRAME_LEN: usize = 29;

/// 摄像机/单元 ID 偏移
pub const OFFSET_CAMERA_ID: usize = 1;
/// Pan（偏航角）偏移
pub const OFFSET_PAN: usize = 2;
/// Tilt（俯仰角）偏移
pub const OFFSET_TILT: usize = 5;
/// Roll（横滚角）偏移
pub const OFFSET_ROLL: usize = 8;
/// 位置 X 偏移
pub const OFFSET_POS_X: usize = 11;
/// 位置 Y 偏移
pub const OFFSET_POS_Y: usize = 14;
/// 位置 Z 偏移
pub const OFFSET_POS_Z: usize = 17;
/// Zoom 编码器偏移
pub const OFFSET_ZOOM: usize = 20;
/// Focus 编码器偏移
pub const OFFSET_FOCUS: usize = 23;
/// 备用字段偏移（2 字节，忽略）
pub const OFFSET_SPARE: usize = 26;
/// 校验字节偏移
pub const OFFSET_CHECKSUM: usize = 28;

// ============================================================================
// Standard Scale Factors
// ============================================================================

/// 角度定点刻度：每度的 LSB 数（15 位小数）
pub const ANGLE_LSB_PER_DEGREE: f64 = 32_768.0;
/// 位置定点刻度：每毫米的 LSB 数（6 位小数）
pub const POSITION_LSB_PER_MM: f64 = 64.0;
/// 镜头编码器刻度：原始计数，无单位
pub const LENS_LSB_PER_COUNT: f64 = 1.0;
