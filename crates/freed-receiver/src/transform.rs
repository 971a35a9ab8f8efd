//! 坐标系转换
//!
//! 跟踪器以"度 + 毫米"上报自身约定下的姿态；消费方要的是
//! "米 + 单位四元数"。本模块是两者之间的纯函数桥：无 I/O、
//! 确定性、可独立于网络层测试。

use freed_protocol::FreedFrame;
use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// 安装约定修正
///
/// 跟踪器的 yaw/pitch/roll 符号与零位取决于云台的物理安装方式。
/// 修正由固定常量描述，与数据无关：先 `tilt + pitch_offset_deg`，
/// 再逐轴乘符号，然后按"roll、pitch 先于 yaw"的内旋顺序合成
/// 四元数；`scalar_last_remap` 决定合成结果的分量如何读出。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountConvention {
    /// yaw（pan）符号
    pub yaw_sign: f64,
    /// pitch（tilt）符号
    pub pitch_sign: f64,
    /// roll 符号
    pub roll_sign: f64,
    /// 俯仰零位偏置（度），在符号翻转之前施加
    pub pitch_offset_deg: f64,
    /// 把合成四元数的分量按 scalar-last 顺序重读为 scalar-first
    /// （w←z、x←w、y←x、z←y）。朝下安装的广播云台需要这一步：
    /// 配合 -90° 俯仰偏置，零角度映射为绕 X 轴 +90° 的相机修正。
    pub scalar_last_remap: bool,
}

impl MountConvention {
    /// 无修正：零角度映射到单位四元数
    pub fn neutral() -> Self {
        Self {
            yaw_sign: 1.0,
            pitch_sign: 1.0,
            roll_sign: 1.0,
            pitch_offset_deg: 0.0,
            scalar_last_remap: false,
        }
    }
}

impl Default for MountConvention {
    /// 默认值对应朝下安装的摄像机云台：yaw/pitch/roll 取反，
    /// 俯仰零位下移 90°，分量重读。零角度的帧映射为绕 X 轴
    /// +90° 的姿态（镜头从朝下摆正到朝前）。
    fn default() -> Self {
        Self {
            yaw_sign: -1.0,
            pitch_sign: -1.0,
            roll_sign: -1.0,
            pitch_offset_deg: -90.0,
            scalar_last_remap: true,
        }
    }
}

/// 核心输出单元：消费方世界系下的一次姿态采样
///
/// 由 `transform` 对每个有效帧构建一次，之后不可变，
/// 所有权随 sink 调用移交给消费方。
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSample {
    /// 数据来源的摄像机/单元 ID
    pub source_id: u8,
    /// 位置（米）
    pub position: Vector3<f64>,
    /// 姿态（单位四元数，消费方世界系）
    pub orientation: UnitQuaternion<f64>,
    /// Zoom 编码器计数
    pub zoom: f64,
    /// Focus 编码器计数
    pub focus: f64,
}

/// 把一个解码帧变换为消费方约定下的姿态采样
///
/// - 位置：毫米 → 米（除以 1000），轴映射保持恒等
/// - 姿态：按约定修正后的 roll/pitch/yaw 以内旋顺序
///   `Rz(yaw) · Ry(pitch) · Rx(roll)` 合成；`scalar_last_remap`
///   约定下分量按 scalar-last 顺序重读（见 [`MountConvention`]）
pub fn transform(frame: &FreedFrame, convention: &MountConvention) -> PoseSample {
    let yaw = (convention.yaw_sign * frame.pan_deg).to_radians();
    let pitch =
        (convention.pitch_sign * (frame.tilt_deg + convention.pitch_offset_deg)).to_radians();
    let roll = (convention.roll_sign * frame.roll_deg).to_radians();

    let orientation = if convention.scalar_last_remap {
        // ZYX 半角展开，四个分量按 scalar-last 顺序读出
        let (sy, cy) = (yaw / 2.0).sin_cos();
        let (sp, cp) = (pitch / 2.0).sin_cos();
        let (sr, cr) = (roll / 2.0).sin_cos();

        let w = cy * cr * sp - sy * sr * cp;
        let x = cy * cr * cp + sy * sr * sp;
        let y = sy * cr * cp - cy * sr * sp;
        let z = cy * sr * cp + sy * cr * sp;
        UnitQuaternion::new_normalize(Quaternion::new(w, x, y, z))
    } else {
        UnitQuaternion::from_euler_angles(roll, pitch, yaw)
    };

    PoseSample {
        source_id: frame.camera_id,
        position: Vector3::new(frame.x_mm, frame.y_mm, frame.z_mm) / 1000.0,
        orientation,
        zoom: frame.zoom,
        focus: frame.focus,
    }
}
