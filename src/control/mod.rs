//! 控制层
//!
//! 误差模型、单轴 PID 与速度指令合成。

pub mod error_model;
pub mod pid;
pub mod synthesizer;

pub use error_model::PoseError;
pub use pid::AxisPid;
pub use synthesizer::{CartesianPidBank, TwistSynthesizer};
