//! 位姿跟踪示例 - 完整接线演示
//!
//! 这个示例展示了如何把跟踪器接到三个外部协作者上：
//! 目标生产线程（模拟订阅回调）、位姿提供者（模拟正向运动学查询）
//! 与指令接收方（crossbeam 通道 + 消费线程，模拟下游伺服层）。
//!
//! # 运行
//!
//! ```bash
//! cargo run --example tracking_demo
//! ```

use crossbeam_channel::bounded;
use pose_tracking::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// 共享的机械臂状态：消费线程按指令积分，提供者读取
#[derive(Clone)]
struct SimulatedArm {
    pose: Arc<Mutex<CartesianPose>>,
}

impl TransformProvider for SimulatedArm {
    fn end_effector_pose(&self) -> Option<CartesianPose> {
        Some(*self.pose.lock().unwrap())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("🎯 Pose Tracking - Closed-Loop Demo");
    println!("====================================\n");

    // 1. 配置控制器
    let config = TrackingConfig {
        loop_rate: 200.0,
        pose_timeout: 0.05,
        startup_timeout: 0.5,
        x: PidGains::new(15.0, 0.0, 0.0),
        y: PidGains::new(15.0, 0.0, 0.0),
        z: PidGains::new(15.0, 0.0, 0.0),
        angular: PidGains::new(15.0, 0.0, 0.0),
        ..Default::default()
    };
    let dt = config.nominal_period().as_secs_f64();

    println!("🔧 跟踪配置:");
    println!("   - 循环频率: {} Hz", config.loop_rate);
    println!("   - 位姿超时: {} s", config.pose_timeout);
    println!("   - 线速度增益 Kp: {}", config.x.k_p);
    println!();

    // 2. 搭建协作者
    let arm = SimulatedArm {
        pose: Arc::new(Mutex::new(CartesianPose::ZERO)),
    };

    let (tx, rx) = bounded::<TwistCommand>(8);

    // 消费线程：把线速度积分回共享位姿（简化的一阶被控对象）
    let plant = arm.clone();
    let consumer = thread::spawn(move || {
        let mut count = 0usize;
        for command in rx.iter() {
            count += 1;
            let mut pose = plant.pose.lock().unwrap();
            pose.position = pose.position + command.twist.linear.scale(dt);
            if count % 20 == 0 {
                println!("   📡 指令 #{}: 位置 {}", count, pose.position);
            }
        }
        count
    });

    let mut tracker = PoseTracker::new(config, arm.clone(), tx, Arc::new(IdentityTransformer))?;

    // 3. 目标生产线程：按固定周期重发目标（模拟流式订阅）
    let goal = CartesianPose::from_position_quaternion(
        Position3D::new(0.25, -0.1, 0.4),
        Quaternion::from_euler(Rad::ZERO, Rad::ZERO, Rad(0.3)),
    );
    println!("▶️  目标位姿: {}\n", goal);

    let writer = tracker.target_writer();
    let done = Arc::new(AtomicBool::new(false));
    let done_flag = Arc::clone(&done);
    let producer = thread::spawn(move || {
        while !done_flag.load(Ordering::SeqCst) {
            writer.update(goal, "base_link");
            thread::sleep(Duration::from_millis(2));
        }
    });

    // 4. 运行跟踪循环（阻塞到终止）
    let tolerance = Tolerance::new([0.002, 0.002, 0.002], Rad(0.01));
    let status = tracker.track_to_pose(tolerance);

    done.store(true, Ordering::SeqCst);
    producer.join().unwrap();
    let sent = {
        drop(tracker);
        consumer.join().unwrap()
    };

    // 5. 结果
    let final_pose = *arm.pose.lock().unwrap();
    println!("\n✅ 跟踪结束: {} (code {})", status, status.code());
    println!("   发出指令数: {}", sent);
    println!("   最终位置: {}", final_pose.position);
    println!("   目标位置: {}", goal.position);
    println!(
        "   残余误差: {:.4} m",
        (goal.position - final_pose.position).norm()
    );

    Ok(())
}
