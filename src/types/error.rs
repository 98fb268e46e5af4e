//! 错误类型体系
//!
//! 跟踪内核的失败路径分两类：
//!
//! - **状态码**: 输入过期与取消请求不是 `Err`，而是
//!   [`TrackingStatus`](crate::tracking::TrackingStatus) 的终止码，
//!   每个跟踪调用总会带着一个状态码返回；
//! - **错误**: 构造期的配置问题与坐标系变换查询失败才使用
//!   `TrackingError`。配置错误发生在内核运行之前，对构造是致命的。
//!
//! # 示例
//!
//! ```rust
//! use pose_tracking::types::TrackingError;
//!
//! let err = TrackingError::invalid_parameter("loop_rate", "must be positive");
//! assert!(err.is_config_error());
//! ```

use thiserror::Error;

/// 位姿跟踪错误类型
#[derive(Debug, Error)]
pub enum TrackingError {
    // ==================== Configuration Errors ====================
    /// 配置错误
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// 参数无效
    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParameter {
        /// 参数名
        param: String,
        /// 原因
        reason: String,
    },

    // ==================== Transform Errors ====================
    /// 坐标系变换查询失败
    ///
    /// 仅在目标位姿换系时出现；调用侧静默跳过本次更新并保留旧缓存。
    #[error("Transform lookup failed: {from} -> {to}")]
    TransformLookupFailed {
        /// 源坐标系
        from: String,
        /// 目标坐标系
        to: String,
    },

    // ==================== I/O Errors ====================
    /// 配置文件读取失败
    #[error("Config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// 配置文件解析失败
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl TrackingError {
    /// 是否为配置错误
    ///
    /// 配置错误对构造跟踪器是致命的，内核不会带着无效配置运行。
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_)
                | Self::InvalidParameter { .. }
                | Self::ConfigIo(_)
                | Self::ConfigParse(_)
        )
    }

    /// 创建配置错误
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// 创建参数无效错误
    pub fn invalid_parameter(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// 创建变换查询失败错误
    pub fn transform_lookup(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::TransformLookupFailed {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, TrackingError>;
