//! 跟踪循环场景测试
//!
//! 用模拟的外部协作者（位姿提供者 / 指令接收方 / 目标生产线程）
//! 驱动完整的 `track_to_pose` 状态机，覆盖四种终止路径。
//!
//! 时间参数刻意取小（毫秒级周期与超时），让过期路径在几个周期内
//! 确定性触发。

use pose_tracking::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// 可共享的末端位姿槽：提供者读取，测试或"被控对象"写入
#[derive(Clone)]
struct SharedArm {
    pose: Arc<Mutex<CartesianPose>>,
    /// false 时提供者返回 None（模拟变换查询不可用）
    live: Arc<AtomicBool>,
    /// 提供者被拉取的次数
    pulls: Arc<AtomicUsize>,
}

impl SharedArm {
    fn new(pose: CartesianPose) -> Self {
        SharedArm {
            pose: Arc::new(Mutex::new(pose)),
            live: Arc::new(AtomicBool::new(true)),
            pulls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn go_dark(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

impl TransformProvider for SharedArm {
    fn end_effector_pose(&self) -> Option<CartesianPose> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        if self.live.load(Ordering::SeqCst) {
            Some(*self.pose.lock().unwrap())
        } else {
            None
        }
    }
}

/// 收集全部指令的接收方，可选在第 N 条指令时触发回调
#[derive(Clone)]
struct RecordingSink {
    commands: Arc<Mutex<Vec<TwistCommand>>>,
    on_nth: Arc<Mutex<Option<(usize, Box<dyn FnMut() + Send>)>>>,
}

impl RecordingSink {
    fn new() -> Self {
        RecordingSink {
            commands: Arc::new(Mutex::new(Vec::new())),
            on_nth: Arc::new(Mutex::new(None)),
        }
    }

    fn trigger_on_nth(&self, n: usize, callback: impl FnMut() + Send + 'static) {
        *self.on_nth.lock().unwrap() = Some((n, Box::new(callback)));
    }

    fn count(&self) -> usize {
        self.commands.lock().unwrap().len()
    }
}

impl CommandSink for RecordingSink {
    fn send(&self, command: TwistCommand) {
        let mut commands = self.commands.lock().unwrap();
        commands.push(command);
        let len = commands.len();
        drop(commands);

        let mut hook = self.on_nth.lock().unwrap();
        if let Some((n, callback)) = hook.as_mut()
            && len == *n
        {
            callback();
        }
    }
}

/// 持续写入目标位姿的后台线程（模拟流式订阅回调）
fn spawn_target_stream(
    writer: TargetPoseWriter,
    target: Arc<Mutex<CartesianPose>>,
) -> (Arc<AtomicBool>, thread::JoinHandle<()>) {
    let done = Arc::new(AtomicBool::new(false));
    let done_flag = Arc::clone(&done);
    let handle = thread::spawn(move || {
        while !done_flag.load(Ordering::SeqCst) {
            let pose = *target.lock().unwrap();
            writer.update(pose, "base_link");
            thread::sleep(Duration::from_millis(1));
        }
    });
    (done, handle)
}

fn config(loop_rate: f64, pose_timeout: f64) -> TrackingConfig {
    TrackingConfig {
        loop_rate,
        pose_timeout,
        startup_timeout: 0.1,
        ..Default::default()
    }
}

fn offset_pose(x: f64, y: f64, z: f64) -> CartesianPose {
    CartesianPose::from_position_quaternion(Position3D::new(x, y, z), Quaternion::IDENTITY)
}

#[test]
fn zero_initial_error_succeeds_on_first_cycle() {
    let arm = SharedArm::new(CartesianPose::ZERO);
    let sink = RecordingSink::new();
    let mut tracker = PoseTracker::new(
        config(1000.0, 0.05),
        arm,
        sink.clone(),
        Arc::new(IdentityTransformer),
    )
    .unwrap();

    let target = Arc::new(Mutex::new(CartesianPose::ZERO));
    let (done, stream) = spawn_target_stream(tracker.target_writer(), target);

    let status = tracker.track_to_pose(Tolerance::new([0.01, 0.01, 0.01], Rad(0.01)));
    done.store(true, Ordering::SeqCst);
    stream.join().unwrap();

    // 第一个周期即成功，没有发出任何指令
    assert_eq!(status, TrackingStatus::Success);
    assert_eq!(sink.count(), 0);
}

#[test]
fn stale_target_at_entry_aborts_without_commands() {
    let arm = SharedArm::new(CartesianPose::ZERO);
    let sink = RecordingSink::new();
    let mut tracker = PoseTracker::new(
        TrackingConfig {
            loop_rate: 1000.0,
            pose_timeout: 0.1,
            startup_timeout: 0.1,
            ..Default::default()
        },
        arm,
        sink.clone(),
        Arc::new(IdentityTransformer),
    )
    .unwrap();

    // 目标只在调用前写入过一次（等价于一条 1 秒前的旧缓存）：
    // 入口作废强制等待新更新，而更新不再到来
    tracker
        .target_writer()
        .update(offset_pose(0.3, 0.0, 0.0), "base_link");
    thread::sleep(Duration::from_millis(20));

    let status = tracker.track_to_pose(Tolerance::new([0.01, 0.01, 0.01], Rad(0.01)));

    assert_eq!(status, TrackingStatus::NoRecentTargetPose);
    assert_eq!(sink.count(), 0);
}

#[test]
fn provider_going_dark_aborts_after_emitted_cycles() {
    // 周期 10ms、位姿超时 5ms：提供者失联后的下一个周期必然过期
    let arm = SharedArm::new(CartesianPose::ZERO);
    let sink = RecordingSink::new();
    let mut tracker = PoseTracker::new(
        config(100.0, 0.005),
        arm.clone(),
        sink.clone(),
        Arc::new(IdentityTransformer),
    )
    .unwrap();

    // 第 3 条指令发出后提供者失联
    let arm_hook = arm.clone();
    sink.trigger_on_nth(3, move || arm_hook.go_dark());

    let target = Arc::new(Mutex::new(offset_pose(0.5, 0.0, 0.0)));
    let (done, stream) = spawn_target_stream(tracker.target_writer(), target);

    let status = tracker.track_to_pose(Tolerance::new([0.01, 0.01, 0.01], Rad(0.01)));
    done.store(true, Ordering::SeqCst);
    stream.join().unwrap();

    // 1-3 周期各发一条指令，随后在第一个过期周期中止
    assert_eq!(status, TrackingStatus::NoRecentEndEffectorPose);
    assert_eq!(sink.count(), 3);
}

#[test]
fn cancellation_mid_track_returns_cancelled() {
    let arm = SharedArm::new(CartesianPose::ZERO);
    let sink = RecordingSink::new();
    let mut tracker = PoseTracker::new(
        config(100.0, 0.05),
        arm,
        sink.clone(),
        Arc::new(IdentityTransformer),
    )
    .unwrap();

    // 第 5 条指令发出后由"并发方"请求取消
    let cancel = tracker.cancel_handle();
    sink.trigger_on_nth(5, move || cancel.request_stop());

    let target = Arc::new(Mutex::new(offset_pose(0.5, 0.0, 0.0)));
    let (done, stream) = spawn_target_stream(tracker.target_writer(), target);

    let status = tracker.track_to_pose(Tolerance::new([0.01, 0.01, 0.01], Rad(0.01)));
    done.store(true, Ordering::SeqCst);
    stream.join().unwrap();

    // 第 6 个周期观察到取消标志，之前恰好发出 5 条指令
    assert_eq!(status, TrackingStatus::Cancelled);
    assert_eq!(sink.count(), 5);
}

#[test]
fn closed_loop_converges_to_target() {
    // 闭环仿真：指令接收方把线速度积分回共享位姿（一阶被控对象）
    let arm = SharedArm::new(CartesianPose::ZERO);
    let gains = PidGains::new(20.0, 0.0, 0.0);
    let cfg = TrackingConfig {
        loop_rate: 200.0,
        pose_timeout: 0.05,
        startup_timeout: 0.1,
        x: gains,
        y: gains,
        z: gains,
        angular: gains,
        ..Default::default()
    };
    let dt = cfg.nominal_period().as_secs_f64();

    let plant = arm.clone();
    let commands_seen = Arc::new(AtomicUsize::new(0));
    let commands_counter = Arc::clone(&commands_seen);
    let integrating_sink = FnSink(move |command: TwistCommand| {
        commands_counter.fetch_add(1, Ordering::SeqCst);
        let mut pose = plant.pose.lock().unwrap();
        pose.position = pose.position + command.twist.linear.scale(dt);
    });

    let mut tracker = PoseTracker::new(
        cfg,
        arm.clone(),
        integrating_sink,
        Arc::new(IdentityTransformer),
    )
    .unwrap();

    let goal = offset_pose(0.05, -0.03, 0.02);
    let target = Arc::new(Mutex::new(goal));
    let (done, stream) = spawn_target_stream(tracker.target_writer(), Arc::clone(&target));

    let status = tracker.track_to_pose(Tolerance::new([0.005, 0.005, 0.005], Rad(0.01)));
    done.store(true, Ordering::SeqCst);
    stream.join().unwrap();

    assert_eq!(status, TrackingStatus::Success);
    assert!(commands_seen.load(Ordering::SeqCst) > 0);

    // 末端确实到达目标附近
    let final_pose = *arm.pose.lock().unwrap();
    assert!((final_pose.position.x - 0.05).abs() < 0.005);
    assert!((final_pose.position.y + 0.03).abs() < 0.005);
    assert!((final_pose.position.z - 0.02).abs() < 0.005);
}

#[test]
fn retargeting_mid_track_follows_latest_update() {
    // latest-wins：跟踪中途把目标改回当前位姿，循环应以成功收束
    let arm = SharedArm::new(CartesianPose::ZERO);
    let sink = RecordingSink::new();
    let mut tracker = PoseTracker::new(
        config(100.0, 0.05),
        arm,
        sink.clone(),
        Arc::new(IdentityTransformer),
    )
    .unwrap();

    let target = Arc::new(Mutex::new(offset_pose(0.5, 0.0, 0.0)));
    let retarget = Arc::clone(&target);
    sink.trigger_on_nth(4, move || {
        *retarget.lock().unwrap() = CartesianPose::ZERO;
    });

    let (done, stream) = spawn_target_stream(tracker.target_writer(), Arc::clone(&target));

    let status = tracker.track_to_pose(Tolerance::new([0.01, 0.01, 0.01], Rad(0.01)));
    done.store(true, Ordering::SeqCst);
    stream.join().unwrap();

    assert_eq!(status, TrackingStatus::Success);
    // 改目标之前确实发出过指令
    assert!(sink.count() >= 4);
}

#[test]
fn consecutive_invocations_start_from_clean_pid_state() {
    // 第一次调用被取消（积分已累积），第二次调用零误差直接成功：
    // 若 PID 状态跨调用泄漏，第二次的容差检查仍会看到残留的
    // 旋转角误差缓存
    let arm = SharedArm::new(CartesianPose::ZERO);
    let sink = RecordingSink::new();
    let gains = PidGains::new(1.0, 0.5, 0.0);
    let cfg = TrackingConfig {
        loop_rate: 100.0,
        pose_timeout: 0.05,
        startup_timeout: 0.1,
        x: gains,
        y: gains,
        z: gains,
        angular: gains,
        ..Default::default()
    };
    let mut tracker =
        PoseTracker::new(cfg, arm, sink.clone(), Arc::new(IdentityTransformer)).unwrap();

    // 第一次：目标带姿态偏差，跑 3 个周期后取消
    let cancel = tracker.cancel_handle();
    sink.trigger_on_nth(3, move || cancel.request_stop());

    let rotated = CartesianPose::from_position_quaternion(
        Position3D::new(0.2, 0.0, 0.0),
        Quaternion::from_axis_angle(Position3D::new(0.0, 0.0, 1.0), Rad(0.5)),
    );
    let target = Arc::new(Mutex::new(rotated));
    let (done, stream) = spawn_target_stream(tracker.target_writer(), Arc::clone(&target));
    let first = tracker.track_to_pose(Tolerance::new([0.01, 0.01, 0.01], Rad(0.01)));
    done.store(true, Ordering::SeqCst);
    stream.join().unwrap();
    assert_eq!(first, TrackingStatus::Cancelled);

    // 第二次：目标 == 当前位姿，必须第一个周期成功且不发指令
    let before = sink.count();
    let target = Arc::new(Mutex::new(CartesianPose::ZERO));
    let (done, stream) = spawn_target_stream(tracker.target_writer(), target);
    let second = tracker.track_to_pose(Tolerance::new([0.01, 0.01, 0.01], Rad(0.01)));
    done.store(true, Ordering::SeqCst);
    stream.join().unwrap();

    assert_eq!(second, TrackingStatus::Success);
    assert_eq!(sink.count(), before);
}
