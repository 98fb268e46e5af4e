//! PID Controller - 比例-积分-微分控制器
//!
//! 单轴标量 PID，四个实例分别驱动 x/y/z 线速度与姿态角速度幅值。
//!
//! # 算法
//!
//! ```text
//! output = Kp * e + Ki * ∫e dt + Kd * de/dt
//! ```
//!
//! 其中：
//! - `e` = 目标 - 当前（误差）
//! - `∫e dt` = 累积误差（积分项）
//! - `de/dt` = 误差变化率（微分项）
//!
//! # 特性
//!
//! - **积分饱和保护**: 积分项钳位到 ±windup_limit，防止积分饱和
//!   （Integral Windup）；可在构造时关闭
//! - **显式重置**: `reset()` 清零积分与上次误差，且只有它会清零 ——
//!   两次跟踪调用之间必须调用，上一段运动的积分不会影响下一段
//! - **dt 异常处理**: `dt <= 0` 时返回零输出并告警
//!
//! # 示例
//!
//! ```rust
//! use pose_tracking::config::PidGains;
//! use pose_tracking::control::AxisPid;
//! use std::time::Duration;
//!
//! let mut pid = AxisPid::new(PidGains::new(10.0, 0.5, 0.1), 0.1, true);
//! let command = pid.compute(0.05, Duration::from_millis(10));
//! assert!(command > 0.0);
//! ```

use crate::config::PidGains;
use std::time::Duration;

/// 单轴 PID 控制器
#[derive(Debug, Clone)]
pub struct AxisPid {
    /// 增益组
    gains: PidGains,

    /// 积分项累积值
    integral: f64,

    /// 上一次的误差（用于计算微分）
    last_error: f64,

    /// 积分项限制（对称钳位 ±windup_limit）
    windup_limit: f64,

    /// 是否启用积分饱和保护
    use_anti_windup: bool,
}

impl AxisPid {
    /// 创建新的单轴 PID 控制器
    ///
    /// # 参数
    ///
    /// - `gains`: 已验证的增益组（非负）
    /// - `windup_limit`: 积分项绝对值上限
    /// - `use_anti_windup`: 是否启用积分钳位
    pub fn new(gains: PidGains, windup_limit: f64, use_anti_windup: bool) -> Self {
        AxisPid {
            gains,
            integral: 0.0,
            last_error: 0.0,
            windup_limit,
            use_anti_windup,
        }
    }

    /// 计算一步控制输出
    ///
    /// 每次调用推进积分累积并更新微分记忆；同样的输入连续调用两次
    /// 会得到不同输出，这是有状态控制器的预期行为。
    ///
    /// `dt` 应为本控制周期实际经过的时间；若不单独测量周期间隔，
    /// 使用标称周期也可接受。
    pub fn compute(&mut self, error: f64, dt: Duration) -> f64 {
        let dt_sec = dt.as_secs_f64();

        // 防止除零
        if dt_sec <= 0.0 {
            tracing::warn!(
                "PID controller received zero or negative dt: {:?}, returning zero output",
                dt
            );
            return 0.0;
        }

        // 1. 积分项累积 + 饱和保护
        self.integral += error * dt_sec;
        if self.use_anti_windup {
            self.integral = self.integral.clamp(-self.windup_limit, self.windup_limit);
        }

        // 2. 微分项
        let derivative = (error - self.last_error) / dt_sec;

        // 3. 更新上一次误差
        self.last_error = error;

        self.gains.k_p * error + self.gains.k_i * self.integral + self.gains.k_d * derivative
    }

    /// 重置控制器状态
    ///
    /// 清零积分累积与上次误差；增益与钳位不变。重置后的首次
    /// `compute` 与新构造控制器的首次 `compute` 输出一致。
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = 0.0;
    }

    /// 获取当前积分项
    ///
    /// 用于调试和监控。
    pub fn integral(&self) -> f64 {
        self.integral
    }
}
