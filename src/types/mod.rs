//! 类型系统
//!
//! 笛卡尔空间类型、强类型单位与错误类型。

pub mod cartesian;
pub mod error;
pub mod units;

pub use cartesian::{
    CartesianPose, CartesianVelocity, Position3D, Quaternion, StampedPose, TwistCommand,
};
pub use error::{Result, TrackingError};
pub use units::Rad;
