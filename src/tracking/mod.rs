//! 跟踪层
//!
//! 目标位姿缓存、跟踪循环状态机与外部协作者接口。

pub mod target_cache;
pub mod tracker;

pub use target_cache::TargetPoseCache;
pub use tracker::{
    CancelHandle, CommandSink, FnSink, FrameTransformer, IdentityTransformer, PoseTracker,
    TargetPoseWriter, Tolerance, TransformProvider,
};

use std::fmt;

/// 跟踪调用的终止状态码
///
/// 每次 `track_to_pose` 调用都以其中之一结束。输入过期与取消
/// 不是错误：它们通过状态码报告，调用前内核已执行运动后重置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingStatus {
    /// 位置与姿态误差同时满足容差
    Success,
    /// 启动等待超时后目标位姿仍不新鲜（从未发出任何指令）
    NoRecentTargetPose,
    /// 跟踪中当前末端位姿过期
    NoRecentEndEffectorPose,
    /// 并发方请求取消
    Cancelled,
}

impl TrackingStatus {
    /// 数值状态码（跨进程上报用）
    pub fn code(&self) -> i8 {
        match self {
            TrackingStatus::Success => 0,
            TrackingStatus::NoRecentTargetPose => 1,
            TrackingStatus::NoRecentEndEffectorPose => 2,
            TrackingStatus::Cancelled => 3,
        }
    }

    /// 是否为成功终止
    pub fn is_success(&self) -> bool {
        matches!(self, TrackingStatus::Success)
    }
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TrackingStatus::Success => "Success",
            TrackingStatus::NoRecentTargetPose => "No recent target pose",
            TrackingStatus::NoRecentEndEffectorPose => "No recent end effector pose",
            TrackingStatus::Cancelled => "Cancelled",
        };
        write!(f, "{text}")
    }
}
