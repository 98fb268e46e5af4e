//! 位姿误差模型
//!
//! 计算目标位姿与当前位姿之间的位置误差和姿态误差。
//!
//! 两个位姿必须已表达在同一跟踪坐标系下 —— 换系是外部协作者的
//! 职责，本模块只做纯计算，无副作用、无失败路径。
//!
//! # 姿态误差算法
//!
//! ```text
//! q_error = q_target * q_current⁻¹
//! angular = q_error 的旋转角（轴角幅值，[0, π]）
//! axis    = q_error 的单位旋转轴
//! ```
//!
//! 旋转角为零时旋转轴无定义（返回零向量），调用方必须把零旋转角
//! 当作"无旋转"处理。

use crate::types::{CartesianPose, Position3D, Rad};

/// 位姿误差（位置 + 姿态）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseError {
    /// 位置误差：target.position - current.position（逐分量）
    pub translation: Position3D,
    /// 姿态误差旋转角，始终非负，落在 [0, π]
    pub angular: Rad,
    /// 姿态误差旋转轴（单位向量；旋转角为零时为零向量）
    pub axis: Position3D,
}

impl PoseError {
    /// 计算两个位姿之间的误差
    ///
    /// 纯函数：不修改任何状态。输入四元数会被防御性归一化。
    pub fn between(target: &CartesianPose, current: &CartesianPose) -> Self {
        let translation = target.position - current.position;

        let q_error = target
            .orientation
            .multiply(&current.orientation.inverse());
        let (axis, angular) = q_error.to_axis_angle();

        PoseError {
            translation,
            angular,
            axis,
        }
    }

    /// 零误差
    pub const ZERO: Self = PoseError {
        translation: Position3D::ZERO,
        angular: Rad::ZERO,
        axis: Position3D::ZERO,
    };
}
