//! 目标位姿缓存
//!
//! 异步到达的目标位姿更新与跟踪循环之间唯一共享的状态。
//!
//! # 设计
//!
//! 缓存是一个可原子替换的不可变值槽（`ArcSwapOption<StampedPose>`）：
//! 写入方整体替换条目，读取方拿到的 `Arc` 快照里位姿与新鲜度
//! 时间戳永远来自同一次写入，不存在撕裂状态。更新语义为
//! latest-wins —— 任意时刻只有最近一次到达的目标位姿存活。
//!
//! 读写双方都无锁：写是一次指针交换，读是 wait-free 的。

use crate::types::{CartesianPose, StampedPose};
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::time::Duration;

/// 目标位姿槽（latest-wins）
#[derive(Debug, Default)]
pub struct TargetPoseCache {
    slot: ArcSwapOption<StampedPose>,
}

impl TargetPoseCache {
    /// 创建空缓存
    pub fn new() -> Self {
        TargetPoseCache {
            slot: ArcSwapOption::empty(),
        }
    }

    /// 写入新目标位姿（latest-wins）
    ///
    /// 新鲜度时间戳取**当前到达时刻**，不使用消息自带的时间戳，
    /// 防止倒填或时钟偏移的时间戳被当作新鲜数据。
    pub fn store(&self, pose: CartesianPose, frame: impl Into<String>) {
        self.slot.store(Some(Arc::new(StampedPose::now(pose, frame))));
    }

    /// 读取当前缓存条目的快照
    pub fn load(&self) -> Option<Arc<StampedPose>> {
        self.slot.load_full()
    }

    /// 缓存条目是否新鲜（存在且年龄 < `timeout`）
    pub fn is_fresh(&self, timeout: Duration) -> bool {
        match self.slot.load().as_deref() {
            Some(entry) => entry.is_fresh(timeout),
            None => false,
        }
    }

    /// 作废当前条目的新鲜度
    ///
    /// 把时间戳回拨 `rollback`，强制后续的新鲜度检查等待一条真正
    /// 新到达的目标位姿 —— 上一次跟踪调用遗留的缓存不得直接触发
    /// 成功。时间戳回拨下溢（进程启动后不久）时直接清空条目，
    /// 效果等价。
    ///
    /// 与写入方并发时 latest-wins：作废期间恰好到达的新目标会
    /// 覆盖作废结果，这正是期望的语义。
    pub fn invalidate(&self, rollback: Duration) {
        let current = self.slot.load_full();
        if let Some(entry) = current {
            match entry.stamp.checked_sub(rollback) {
                Some(stamp) => {
                    self.slot.store(Some(Arc::new(StampedPose {
                        pose: entry.pose,
                        frame: entry.frame.clone(),
                        stamp,
                    })));
                }
                None => self.slot.store(None),
            }
        }
    }
}
