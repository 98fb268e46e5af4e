//! Pose Tracking - 笛卡尔位姿跟踪控制器
//!
//! 闭环位姿跟踪内核：给定持续更新的目标位姿与当前末端位姿，逐周期
//! 计算驱动末端逼近目标的速度指令（线速度 + 角速度），并决定继续
//! 运动、宣告成功还是中止。
//!
//! # 架构设计
//!
//! 自底向上分为三层：
//!
//! - **类型层** (`types`): 笛卡尔位姿/速度、四元数误差代数、强类型
//!   单位与错误类型
//! - **控制层** (`control`): 误差模型、四个独立的单轴 PID（积分
//!   饱和保护 + 显式重置）、速度指令合成
//! - **跟踪层** (`tracking`): 目标缓存（原子替换、latest-wins）、
//!   新鲜度/容差/取消状态机与外部协作者接口
//!
//! 传输、速度-关节映射与参数加载都是外部协作者，内核只通过
//! trait 接缝消费它们：[`TransformProvider`]（拉取当前位姿）、
//! [`CommandSink`]（推送指令）、[`FrameTransformer`]（目标换系）。
//!
//! # 快速开始
//!
//! ```rust
//! use pose_tracking::prelude::*;
//! ```
//!
//! 完整的接线示例见 `demos/tracking_demo.rs`。

pub mod config;
pub mod control;
pub mod tracking;
pub mod types;

// Prelude 模块
pub mod prelude;

// --- 用户以此为界 ---
// 以下是通过 Facade Pattern 提供的公共 API

pub use config::{PidGains, TrackingConfig};
pub use control::{AxisPid, CartesianPidBank, PoseError, TwistSynthesizer};
pub use tracking::{
    CancelHandle, CommandSink, FnSink, FrameTransformer, IdentityTransformer, PoseTracker,
    TargetPoseCache, TargetPoseWriter, Tolerance, TrackingStatus, TransformProvider,
};
pub use types::{
    CartesianPose, CartesianVelocity, Position3D, Quaternion, Rad, Result, StampedPose,
    TrackingError, TwistCommand,
};
