//! Prelude - 常用类型的便捷导入
//!
//! 大多数用户应该使用这个模块来导入常用类型：
//!
//! ```rust
//! use pose_tracking::prelude::*;
//! ```

// 跟踪层（推荐入口）
pub use crate::tracking::{
    CancelHandle, CommandSink, FnSink, FrameTransformer, IdentityTransformer, PoseTracker,
    TargetPoseWriter, Tolerance, TrackingStatus, TransformProvider,
};

// 配置
pub use crate::config::{PidGains, TrackingConfig};

// 控制层（自定义控制律时使用）
pub use crate::control::{AxisPid, PoseError, TwistSynthesizer};

// 类型系统
pub use crate::types::{
    CartesianPose, CartesianVelocity, Position3D, Quaternion, Rad, StampedPose, TwistCommand,
};

// 错误类型
pub use crate::types::TrackingError;
