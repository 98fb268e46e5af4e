//! 速度指令合成器
//!
//! 把位姿误差转换为笛卡尔速度指令：三个线速度分量各由一个独立
//! PID 驱动，角速度由**一个标量 PID** 驱动旋转角幅值、再沿误差
//! 旋转轴展开为三维角速度。
//!
//! 单标量姿态 PID 是刻意的简化：同一组增益决定旋转角误差的收敛
//! 速率，与旋转轴方向无关。拆成三个独立旋转 PID 会改变跟踪动力学。
//!
//! # 副作用
//!
//! `synthesize` 推进 PID 积分状态并缓存本周期的旋转角误差 ——
//! 同样的输入调用两次输出不同，这是有状态控制律的预期行为。
//! 缓存的旋转角供容差检查复用，避免每周期重复计算四元数误差。

use super::error_model::PoseError;
use super::pid::AxisPid;
use crate::config::TrackingConfig;
use crate::types::{CartesianVelocity, Rad};
use std::time::Duration;

/// 四轴 PID 组
///
/// 轴的身份固定（x、y、z 线速度 + 姿态标量），运行期不会扩展，
/// 因此建模为固定的四字段结构体而不是动态集合。
#[derive(Debug, Clone)]
pub struct CartesianPidBank {
    /// X 轴线速度 PID
    pub x: AxisPid,
    /// Y 轴线速度 PID
    pub y: AxisPid,
    /// Z 轴线速度 PID
    pub z: AxisPid,
    /// 姿态角速度幅值 PID
    pub angular: AxisPid,
}

impl CartesianPidBank {
    /// 从已验证的配置构造四个控制器
    ///
    /// 积分饱和保护默认启用，四轴共用同一 windup 钳位。
    pub fn from_config(config: &TrackingConfig) -> Self {
        let use_anti_windup = true;
        CartesianPidBank {
            x: AxisPid::new(config.x, config.windup_limit, use_anti_windup),
            y: AxisPid::new(config.y, config.windup_limit, use_anti_windup),
            z: AxisPid::new(config.z, config.windup_limit, use_anti_windup),
            angular: AxisPid::new(config.angular, config.windup_limit, use_anti_windup),
        }
    }

    /// 重置全部四个控制器
    pub fn reset_all(&mut self) {
        self.x.reset();
        self.y.reset();
        self.z.reset();
        self.angular.reset();
    }
}

/// 速度指令合成器
///
/// 持有四轴 PID 组与最近一个周期的旋转角误差缓存。
#[derive(Debug, Clone)]
pub struct TwistSynthesizer {
    pids: CartesianPidBank,
    /// 最近一次 `synthesize` 计算出的旋转角误差（供容差检查复用）
    angular_error: Rad,
}

impl TwistSynthesizer {
    /// 从已验证的配置构造
    pub fn from_config(config: &TrackingConfig) -> Self {
        TwistSynthesizer {
            pids: CartesianPidBank::from_config(config),
            angular_error: Rad::ZERO,
        }
    }

    /// 合成一个周期的速度指令
    ///
    /// - 线速度：x/y/z PID 分别作用于位置误差分量
    /// - 角速度：标量 PID 作用于旋转角误差得到幅值，再乘以误差旋转轴
    ///
    /// 旋转角为零时误差轴为零向量，角速度自然为零，与轴无定义的
    /// 约定一致。
    pub fn synthesize(&mut self, error: &PoseError, dt: Duration) -> CartesianVelocity {
        let linear = crate::types::Position3D::new(
            self.pids.x.compute(error.translation.x, dt),
            self.pids.y.compute(error.translation.y, dt),
            self.pids.z.compute(error.translation.z, dt),
        );

        // 缓存旋转角误差，供容差检查使用
        self.angular_error = error.angular;

        let angular_magnitude = self.pids.angular.compute(error.angular.0, dt);
        let angular = error.axis.scale(angular_magnitude);

        CartesianVelocity::new(linear, angular)
    }

    /// 最近一个周期缓存的旋转角误差
    pub fn angular_error(&self) -> Rad {
        self.angular_error
    }

    /// 运动后重置
    ///
    /// 清零四个 PID 的状态与旋转角误差缓存。每次跟踪调用结束
    /// （无论成功或中止）都必须执行。
    pub fn reset(&mut self) {
        self.pids.reset_all();
        self.angular_error = Rad::ZERO;
    }

    /// 只读访问 PID 组（测试与监控用）
    pub fn pids(&self) -> &CartesianPidBank {
        &self.pids
    }
}
