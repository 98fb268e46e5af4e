//! 跟踪循环
//!
//! 闭环位姿跟踪的状态机：等待新鲜输入 → 逐周期跟踪 → 以状态码
//! 终止（成功 / 目标过期 / 当前位姿过期 / 被取消）。
//!
//! # 并发模型
//!
//! 一次跟踪调用内循环是单线程协作式的：两个周期不会重叠，PID
//! 状态只被这一个线程触碰。与外界共享的状态只有两处 ——
//!
//! - 目标位姿槽（[`TargetPoseCache`]）：异步生产方经
//!   [`TargetPoseWriter`] 写入，循环读取，latest-wins；
//! - 取消标志（`AtomicBool`）：并发方经 [`CancelHandle`] 置位，
//!   循环每周期检查一次，协作式取消，绝不打断进行中的 PID 计算
//!   或指令发送。
//!
//! 阻塞只发生在启动等待（有上限、每次尝试间短暂休眠）和周期间的
//! 标称速率休眠两处。除启动等待外没有任何重试：其余失败路径都
//! 立即以状态码终止本次调用。
//!
//! # 使用示例
//!
//! ```rust,no_run
//! use pose_tracking::prelude::*;
//! use std::sync::Arc;
//!
//! # struct MyProvider;
//! # impl TransformProvider for MyProvider {
//! #     fn end_effector_pose(&self) -> Option<CartesianPose> { None }
//! # }
//! # fn example() -> pose_tracking::types::Result<()> {
//! let config = TrackingConfig::default();
//! let (tx, rx) = crossbeam_channel::unbounded();
//! let mut tracker =
//!     PoseTracker::new(config, MyProvider, tx, Arc::new(IdentityTransformer))?;
//!
//! // 目标位姿由另一个线程推送
//! let writer = tracker.target_writer();
//! std::thread::spawn(move || {
//!     writer.update(CartesianPose::ZERO, "base_link");
//! });
//!
//! let status = tracker.track_to_pose(Tolerance::new([0.01, 0.01, 0.01], Rad(0.01)));
//! println!("tracking finished: {status}");
//! # Ok(())
//! # }
//! ```

use super::TrackingStatus;
use super::target_cache::TargetPoseCache;
use crate::config::TrackingConfig;
use crate::control::{PoseError, TwistSynthesizer};
use crate::types::{CartesianPose, Rad, Result, StampedPose, TwistCommand};
use spin_sleep::SpinSleeper;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// 启动等待的轮询间隔
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// 末端位姿提供者（拉取）
///
/// 按需返回**已表达在跟踪坐标系下**的当前末端位姿；`None` 表示
/// 本次不可用。由速度-关节映射层或传感系统实现。
pub trait TransformProvider {
    /// 拉取当前末端位姿（跟踪坐标系下）
    fn end_effector_pose(&self) -> Option<CartesianPose>;
}

/// 坐标系变换查询（目标位姿换系用）
///
/// 当目标位姿以别的坐标系到达时，[`TargetPoseWriter`] 用它把位姿
/// 重表达到跟踪坐标系。查询失败时本次更新被静默跳过。
pub trait FrameTransformer: Send + Sync {
    /// 把 `pose` 从 `from` 坐标系重表达到 `to` 坐标系
    fn transform(&self, pose: &CartesianPose, from: &str, to: &str) -> Result<CartesianPose>;
}

/// 恒等变换器
///
/// 单坐标系系统用：所有位姿视为已在跟踪坐标系下，原样返回。
pub struct IdentityTransformer;

impl FrameTransformer for IdentityTransformer {
    fn transform(&self, pose: &CartesianPose, _from: &str, _to: &str) -> Result<CartesianPose> {
        Ok(*pose)
    }
}

/// 速度指令接收方（推送，fire-and-forget）
///
/// 每个控制周期接收一条指令；内核不要求确认，发送失败由下游
/// 自行处理。
pub trait CommandSink {
    /// 接收一条速度指令
    fn send(&self, command: TwistCommand);
}

/// crossbeam 通道即开即用的指令接收方
///
/// 接收端掉线时指令被丢弃，与 fire-and-forget 语义一致。
impl CommandSink for crossbeam_channel::Sender<TwistCommand> {
    fn send(&self, command: TwistCommand) {
        if crossbeam_channel::Sender::send(self, command).is_err() {
            tracing::debug!("Command sink receiver dropped, discarding twist command");
        }
    }
}

/// 闭包适配器：把任意 `Fn(TwistCommand)` 包装成指令接收方
///
/// 测试与仿真场景常用（如把速度积分回被控对象模型）。
pub struct FnSink<F>(pub F);

impl<F: Fn(TwistCommand)> CommandSink for FnSink<F> {
    fn send(&self, command: TwistCommand) {
        (self.0)(command);
    }
}

/// 目标位姿写入句柄
///
/// 交给异步生产方（订阅回调、网络线程）的受限接口：只能写目标
/// 缓存，不能触碰跟踪循环的其它状态。可廉价 `Clone`。
#[derive(Clone)]
pub struct TargetPoseWriter {
    cache: Arc<TargetPoseCache>,
    transformer: Arc<dyn FrameTransformer>,
    tracking_frame: Arc<str>,
}

impl TargetPoseWriter {
    /// 写入一条目标位姿更新
    ///
    /// `frame` 与跟踪坐标系不同时先换系再缓存；变换查询失败时
    /// 本次更新被静默跳过，旧缓存（连同其新鲜度）原样保留 ——
    /// 循环自身的过期检查最终会发现真正卡死的目标。
    ///
    /// 缓存时间戳取本地到达时刻，不使用消息自带的时间戳。
    pub fn update(&self, pose: CartesianPose, frame: &str) {
        let pose_in_tracking_frame = if frame != self.tracking_frame.as_ref() {
            match self
                .transformer
                .transform(&pose, frame, self.tracking_frame.as_ref())
            {
                Ok(transformed) => transformed,
                Err(err) => {
                    tracing::debug!(
                        "Skipping target pose update, transform lookup failed: {err}"
                    );
                    return;
                }
            }
        } else {
            pose
        };

        self.cache
            .store(pose_in_tracking_frame, self.tracking_frame.as_ref());
    }
}

/// 取消句柄
///
/// 供并发方（如操作员中止指令）提前终止跟踪循环。标志每周期被
/// 检查一次；置位后循环在下一个周期以 `Cancelled` 返回。
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// 请求停止当前跟踪调用
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

/// 容差（一次跟踪调用内不可变）
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// 逐轴位置容差（米），与 x/y/z 误差分量逐一比较
    pub positional: [f64; 3],
    /// 旋转角容差
    pub angular: Rad,
}

impl Tolerance {
    /// 创建容差
    pub const fn new(positional: [f64; 3], angular: Rad) -> Self {
        Tolerance {
            positional,
            angular,
        }
    }
}

/// 位姿跟踪器
///
/// 状态机：`WAITING_FOR_FRESH_INPUT` → `TRACKING` → 终止。
/// 所有终止路径（成功或中止）都先执行运动后重置 —— 清零四个 PID、
/// 旋转角误差缓存与取消标志 —— 再返回状态码，保证上一段运动的
/// 积分累积对下一次调用零影响。
pub struct PoseTracker<P, S> {
    config: TrackingConfig,
    target: Arc<TargetPoseCache>,
    transformer: Arc<dyn FrameTransformer>,
    provider: P,
    sink: S,
    synthesizer: TwistSynthesizer,
    /// 最近一次成功拉取的末端位姿 + 新鲜度时间戳
    end_effector: Option<StampedPose>,
    stop_requested: Arc<AtomicBool>,
}

impl<P: TransformProvider, S: CommandSink> PoseTracker<P, S> {
    /// 构造跟踪器
    ///
    /// 配置在此处校验；无效配置（非正周期、负增益）无法构造内核。
    pub fn new(
        config: TrackingConfig,
        provider: P,
        sink: S,
        transformer: Arc<dyn FrameTransformer>,
    ) -> Result<Self> {
        config.validate()?;
        let synthesizer = TwistSynthesizer::from_config(&config);
        Ok(PoseTracker {
            config,
            target: Arc::new(TargetPoseCache::new()),
            transformer,
            provider,
            sink,
            synthesizer,
            end_effector: None,
            stop_requested: Arc::new(AtomicBool::new(false)),
        })
    }

    /// 获取目标位姿写入句柄（交给异步生产方）
    pub fn target_writer(&self) -> TargetPoseWriter {
        TargetPoseWriter {
            cache: Arc::clone(&self.target),
            transformer: Arc::clone(&self.transformer),
            tracking_frame: Arc::from(self.config.planning_frame.as_str()),
        }
    }

    /// 获取取消句柄（交给并发控制方）
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.stop_requested),
        }
    }

    /// 跟踪配置（只读）
    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// 跟踪到目标位姿
    ///
    /// 1. 作废缓存目标的新鲜度（回拨 2 倍位姿超时），强制等待一条
    ///    真正新到达的目标 —— 上次调用遗留的缓存不得直接触发成功；
    /// 2. 有上限地轮询，直到目标位姿与当前末端位姿都新鲜；
    /// 3. 启动超时后目标仍不新鲜 → `NoRecentTargetPose`（从未发出
    ///    任何指令）；
    /// 4. 逐周期循环：先查容差（满足 → `Success`），再刷新当前
    ///    位姿（过期 → `NoRecentEndEffectorPose`），再查取消标志
    ///    （置位 → `Cancelled`），否则合成并发出一条速度指令；
    /// 5. 循环以标称速率运行；喂给 PID 的 `dt` 恒为标称周期，
    ///    周期抖动不改变增益标度。
    pub fn track_to_pose(&mut self, tolerance: Tolerance) -> TrackingStatus {
        let pose_timeout = self.config.pose_timeout();
        self.target.invalidate(2 * pose_timeout);

        tracing::debug!(
            frame = %self.config.planning_frame,
            group = %self.config.move_group,
            "Waiting for fresh target and end effector poses"
        );

        // 有上限的启动等待：目标位姿可能在等待期间由回调线程更新
        let start = Instant::now();
        while (!self.target.is_fresh(pose_timeout) || !self.have_recent_end_effector_pose())
            && start.elapsed() < self.config.startup_timeout()
        {
            self.refresh_end_effector_pose();
            std::thread::sleep(STARTUP_POLL_INTERVAL);
        }

        if !self.target.is_fresh(pose_timeout) {
            tracing::error!("The target pose was not updated recently. Aborting.");
            self.post_motion_reset();
            return TrackingStatus::NoRecentTargetPose;
        }

        let period = self.config.nominal_period();
        let sleeper = SpinSleeper::default();

        loop {
            // 终止条件逐项检查：
            // - 容差满足
            // - 当前位姿过期
            // - 并发方请求取消
            if self.satisfies_pose_tolerance(&tolerance) {
                break;
            }

            self.refresh_end_effector_pose();
            if !self.have_recent_end_effector_pose() {
                tracing::error!("The end effector pose was not updated in time. Aborting.");
                self.post_motion_reset();
                return TrackingStatus::NoRecentEndEffectorPose;
            }

            if self.stop_requested.load(Ordering::SeqCst) {
                tracing::info!("Halting tracking, a stop was requested.");
                self.post_motion_reset();
                return TrackingStatus::Cancelled;
            }

            if let Some(command) = self.calculate_twist_command(period) {
                self.sink.send(command);
            }

            sleeper.sleep(period);
        }

        tracing::info!("Pose tolerance satisfied.");
        self.post_motion_reset();
        TrackingStatus::Success
    }

    /// 尝试从提供者拉取新的末端位姿；成功则更新新鲜度时间戳
    fn refresh_end_effector_pose(&mut self) {
        if let Some(pose) = self.provider.end_effector_pose() {
            self.end_effector = Some(StampedPose::now(pose, self.config.planning_frame.as_str()));
        }
    }

    fn have_recent_end_effector_pose(&self) -> bool {
        self.end_effector
            .as_ref()
            .is_some_and(|stamped| stamped.is_fresh(self.config.pose_timeout()))
    }

    /// 容差检查：逐轴位置误差与旋转角误差必须同时满足
    ///
    /// 位置误差按最新快照现算；旋转角误差取最近一个合成周期的
    /// 缓存值，避免在检查路径上重复四元数计算。
    fn satisfies_pose_tolerance(&self, tolerance: &Tolerance) -> bool {
        let Some(target) = self.target.load() else {
            return false;
        };
        let Some(current) = self.end_effector.as_ref() else {
            return false;
        };

        let translation = target.pose.position - current.pose.position;
        translation.x.abs() < tolerance.positional[0]
            && translation.y.abs() < tolerance.positional[1]
            && translation.z.abs() < tolerance.positional[2]
            && self.synthesizer.angular_error().abs() < tolerance.angular
    }

    /// 合成本周期的速度指令
    ///
    /// 目标或当前位姿缺失时返回 `None`（循环入口的新鲜度检查
    /// 保证了正常路径上两者都存在）。
    fn calculate_twist_command(&mut self, dt: Duration) -> Option<TwistCommand> {
        let target = self.target.load()?;
        let current = self.end_effector.as_ref()?;

        let error = PoseError::between(&target.pose, &current.pose);
        let twist = self.synthesizer.synthesize(&error, dt);

        Some(TwistCommand::now(target.frame.clone(), twist))
    }

    /// 运动后重置
    ///
    /// 清取消标志、清旋转角误差缓存、重置四个 PID。所有终止路径
    /// 都必须经过这里。
    fn post_motion_reset(&mut self) {
        self.stop_requested.store(false, Ordering::SeqCst);
        self.synthesizer.reset();
    }
}
