//! # 跟踪配置
//!
//! 位姿跟踪控制器的配置加载与校验。
//!
//! 配置在进入内核之前完成校验：`PoseTracker` 假定拿到的配置
//! 一定有效（周期为正、增益非负）。带着无效配置无法构造跟踪器。
//!
//! # 示例
//!
//! ```rust
//! use pose_tracking::config::TrackingConfig;
//!
//! let config = TrackingConfig::default();
//! assert!(config.validate().is_ok());
//! ```

use crate::types::{Result, TrackingError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

fn default_planning_frame() -> String {
    "base_link".to_string()
}

fn default_move_group() -> String {
    "arm".to_string()
}

fn default_loop_rate() -> f64 {
    100.0
}

fn default_pose_timeout() -> f64 {
    0.1
}

fn default_startup_timeout() -> f64 {
    0.1
}

fn default_windup_limit() -> f64 {
    0.1
}

fn default_k_p() -> f64 {
    1.0
}

/// 单轴 PID 增益
///
/// 由外部配置层加载校验后传入控制器，控制器只消费已验证的值。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PidGains {
    /// 比例增益
    #[serde(default = "default_k_p")]
    pub k_p: f64,
    /// 积分增益
    #[serde(default)]
    pub k_i: f64,
    /// 微分增益
    #[serde(default)]
    pub k_d: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        PidGains {
            k_p: default_k_p(),
            k_i: 0.0,
            k_d: 0.0,
        }
    }
}

impl PidGains {
    /// 创建新的增益组
    pub const fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        PidGains { k_p, k_i, k_d }
    }

    fn validate(&self, axis: &str) -> Result<()> {
        for (name, value) in [("k_p", self.k_p), ("k_i", self.k_i), ("k_d", self.k_d)] {
            if !value.is_finite() || value < 0.0 {
                return Err(TrackingError::invalid_parameter(
                    format!("{axis}.{name}"),
                    format!("must be finite and non-negative, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// 跟踪配置
///
/// 字段与单位：
///
/// | 字段 | 单位 | 默认值 |
/// |------|------|--------|
/// | `loop_rate` | Hz | 100.0 |
/// | `pose_timeout` | 秒 | 0.1 |
/// | `startup_timeout` | 秒 | 0.1 |
/// | `windup_limit` | 对称钳位 | 0.1 |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// 跟踪坐标系名：所有误差计算都在此坐标系下进行
    #[serde(default = "default_planning_frame")]
    pub planning_frame: String,

    /// 受控关节组标识（由下游速度-关节映射层使用）
    #[serde(default = "default_move_group")]
    pub move_group: String,

    /// 控制循环标称频率（Hz）
    #[serde(default = "default_loop_rate")]
    pub loop_rate: f64,

    /// 位姿新鲜度超时（秒）：缓存年龄达到该值即视为过期
    #[serde(default = "default_pose_timeout")]
    pub pose_timeout: f64,

    /// 启动等待上限（秒）：等待首个新鲜目标/当前位姿的时间
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout: f64,

    /// 积分饱和钳位（四轴共用，对称 ±windup_limit）
    #[serde(default = "default_windup_limit")]
    pub windup_limit: f64,

    /// X 轴线速度 PID 增益
    #[serde(default)]
    pub x: PidGains,

    /// Y 轴线速度 PID 增益
    #[serde(default)]
    pub y: PidGains,

    /// Z 轴线速度 PID 增益
    #[serde(default)]
    pub z: PidGains,

    /// 姿态角速度标量 PID 增益
    ///
    /// 单组标量增益驱动旋转角误差的收敛速率，与旋转轴方向无关。
    #[serde(default)]
    pub angular: PidGains,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        TrackingConfig {
            planning_frame: default_planning_frame(),
            move_group: default_move_group(),
            loop_rate: default_loop_rate(),
            pose_timeout: default_pose_timeout(),
            startup_timeout: default_startup_timeout(),
            windup_limit: default_windup_limit(),
            x: PidGains::default(),
            y: PidGains::default(),
            z: PidGains::default(),
            angular: PidGains::default(),
        }
    }
}

impl TrackingConfig {
    /// 从 TOML 文件加载配置
    ///
    /// 加载后立即校验，无效配置直接返回错误。
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: TrackingConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    ///
    /// 检查项：
    /// - `loop_rate`、`pose_timeout`、`startup_timeout` 必须为正且有限
    /// - `windup_limit` 非负
    /// - 四组增益均有限且非负
    /// - 坐标系名与关节组名非空
    pub fn validate(&self) -> Result<()> {
        if self.planning_frame.is_empty() {
            return Err(TrackingError::invalid_parameter(
                "planning_frame",
                "must not be empty",
            ));
        }
        if self.move_group.is_empty() {
            return Err(TrackingError::invalid_parameter(
                "move_group",
                "must not be empty",
            ));
        }
        if !self.loop_rate.is_finite() || self.loop_rate <= 0.0 {
            return Err(TrackingError::invalid_parameter(
                "loop_rate",
                format!("must be positive, got {}", self.loop_rate),
            ));
        }
        if self.loop_rate > 10000.0 {
            tracing::warn!(
                "Very high control frequency: {} Hz. This may cause performance issues.",
                self.loop_rate
            );
        }
        if !self.pose_timeout.is_finite() || self.pose_timeout <= 0.0 {
            return Err(TrackingError::invalid_parameter(
                "pose_timeout",
                format!("must be positive, got {}", self.pose_timeout),
            ));
        }
        if !self.startup_timeout.is_finite() || self.startup_timeout <= 0.0 {
            return Err(TrackingError::invalid_parameter(
                "startup_timeout",
                format!("must be positive, got {}", self.startup_timeout),
            ));
        }
        if !self.windup_limit.is_finite() || self.windup_limit < 0.0 {
            return Err(TrackingError::invalid_parameter(
                "windup_limit",
                format!("must be non-negative, got {}", self.windup_limit),
            ));
        }
        self.x.validate("x")?;
        self.y.validate("y")?;
        self.z.validate("z")?;
        self.angular.validate("angular")?;
        Ok(())
    }

    /// 控制循环标称周期
    pub fn nominal_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.loop_rate)
    }

    /// 位姿新鲜度超时
    pub fn pose_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.pose_timeout)
    }

    /// 启动等待上限
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.startup_timeout)
    }
}
