//! 笛卡尔空间类型
//!
//! 提供3D位姿、速度和指令消息的表示，用于笛卡尔空间位姿跟踪。
//!
//! # 设计目标
//!
//! - **完整表示**: 位姿（位置+姿态）、速度、带坐标系标签的消息
//! - **数值稳定**: 四元数归一化防止NaN传播
//! - **误差代数**: 四元数提供 `inverse()` 与 `to_axis_angle()`，
//!   支撑 `q_error = q_target * q_current⁻¹` 的姿态误差计算
//!
//! # 示例
//!
//! ```rust
//! use pose_tracking::types::{CartesianPose, Quaternion, Rad};
//!
//! // 创建位姿
//! let pose = CartesianPose::from_position_euler(
//!     0.5, 0.0, 0.3,  // x, y, z (米)
//!     Rad(0.0), Rad(0.0), Rad(1.57),  // roll, pitch, yaw
//! );
//!
//! // 姿态误差：旋转角始终落在 [0, π]
//! let q_error = pose.orientation.multiply(&Quaternion::IDENTITY.inverse());
//! let (_axis, angle) = q_error.to_axis_angle();
//! assert!(angle >= Rad::ZERO && angle <= Rad::PI);
//! ```

use super::units::Rad;
use std::fmt;
use std::time::{Instant, SystemTime};

/// 四元数归一化阈值（避免除零）
///
/// 当四元数的模平方小于此值时，归一化会返回单位四元数。
const QUATERNION_NORM_THRESHOLD: f64 = 1e-10;

/// 旋转轴提取阈值
///
/// 当误差四元数的虚部模小于此值时，旋转角视为零，旋转轴无定义，
/// 返回零向量。调用方必须把零旋转角当作"无旋转"处理，不得依赖轴的值。
const AXIS_NORM_THRESHOLD: f64 = 1e-10;

/// 三维向量（米，或按上下文为 米/秒、弧度/秒）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position3D {
    /// X 分量
    pub x: f64,
    /// Y 分量
    pub y: f64,
    /// Z 分量
    pub z: f64,
}

impl Position3D {
    /// 创建新的三维向量
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Position3D { x, y, z }
    }

    /// 零向量
    pub const ZERO: Self = Position3D::new(0.0, 0.0, 0.0);

    /// 计算向量长度（范数）
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// 归一化（单位向量）
    ///
    /// 模接近 0 时返回零向量，避免除零。
    pub fn normalize(&self) -> Self {
        let n = self.norm();
        if n < 1e-10 {
            return Position3D::ZERO;
        }
        Position3D {
            x: self.x / n,
            y: self.y / n,
            z: self.z / n,
        }
    }

    /// 标量缩放
    pub fn scale(&self, factor: f64) -> Self {
        Position3D {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }
}

impl std::ops::Sub for Position3D {
    type Output = Position3D;

    fn sub(self, rhs: Position3D) -> Position3D {
        Position3D {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl std::ops::Add for Position3D {
    type Output = Position3D;

    fn add(self, rhs: Position3D) -> Position3D {
        Position3D {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl fmt::Display for Position3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// 四元数（用于表示3D旋转）
///
/// 四元数是表示3D旋转的数学工具，避免了欧拉角的万向节锁问题。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    /// 实部
    pub w: f64,
    /// 虚部 i
    pub x: f64,
    /// 虚部 j
    pub y: f64,
    /// 虚部 k
    pub z: f64,
}

impl Quaternion {
    /// 单位四元数（无旋转）
    pub const IDENTITY: Self = Quaternion {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// 从欧拉角创建四元数（Roll-Pitch-Yaw, ZYX顺序）
    ///
    /// # 参数
    ///
    /// - `roll`: 绕X轴旋转
    /// - `pitch`: 绕Y轴旋转
    /// - `yaw`: 绕Z轴旋转
    pub fn from_euler(roll: Rad, pitch: Rad, yaw: Rad) -> Self {
        let cr = (roll.0 / 2.0).cos();
        let sr = (roll.0 / 2.0).sin();
        let cp = (pitch.0 / 2.0).cos();
        let sp = (pitch.0 / 2.0).sin();
        let cy = (yaw.0 / 2.0).cos();
        let sy = (yaw.0 / 2.0).sin();

        Quaternion {
            w: cr * cp * cy + sr * sp * sy,
            x: sr * cp * cy - cr * sp * sy,
            y: cr * sp * cy + sr * cp * sy,
            z: cr * cp * sy - sr * sp * cy,
        }
    }

    /// 从轴角创建四元数
    ///
    /// `axis` 不要求预先归一化；零轴返回单位四元数。
    pub fn from_axis_angle(axis: Position3D, angle: Rad) -> Self {
        let unit = axis.normalize();
        if unit == Position3D::ZERO {
            return Quaternion::IDENTITY;
        }
        let half = angle.0 / 2.0;
        let s = half.sin();
        Quaternion {
            w: half.cos(),
            x: unit.x * s,
            y: unit.y * s,
            z: unit.z * s,
        }
    }

    /// 归一化（确保单位四元数）
    ///
    /// # 数值稳定性
    ///
    /// 如果四元数的模接近 0（< 1e-10），返回默认单位四元数 (1, 0, 0, 0)
    /// 以避免除零错误和 NaN 扩散。
    pub fn normalize(&self) -> Self {
        let norm_sq = self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z;

        if norm_sq < QUATERNION_NORM_THRESHOLD {
            tracing::warn!(
                "Normalizing near-zero quaternion (norm²={:.2e} < {:.2e}): Q({:.3}, {:.3}, {:.3}, {:.3}), returning identity",
                norm_sq,
                QUATERNION_NORM_THRESHOLD,
                self.w,
                self.x,
                self.y,
                self.z
            );
            return Quaternion::IDENTITY;
        }

        let norm = norm_sq.sqrt();
        Quaternion {
            w: self.w / norm,
            x: self.x / norm,
            y: self.y / norm,
            z: self.z / norm,
        }
    }

    /// 四元数乘法（组合旋转）
    pub fn multiply(&self, other: &Quaternion) -> Quaternion {
        Quaternion {
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
        }
    }

    /// 共轭
    pub fn conjugate(&self) -> Quaternion {
        Quaternion {
            w: self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    /// 逆旋转
    ///
    /// 对单位四元数而言逆等于共轭；此处先归一化以保证前提成立。
    pub fn inverse(&self) -> Quaternion {
        self.normalize().conjugate()
    }

    /// 提取轴角表示 `(axis, angle)`
    ///
    /// 旋转角始终落在 `[0, π]`：当实部为负时先取反四元数
    /// （q 和 -q 表示同一旋转），保证取到短旋转方向。
    ///
    /// 旋转角数值为零时轴无定义，返回零向量；调用方必须把零旋转角
    /// 当作"无旋转"处理，不得依赖轴的取值。
    pub fn to_axis_angle(&self) -> (Position3D, Rad) {
        let q = self.normalize();
        let (w, x, y, z) = if q.w < 0.0 {
            (-q.w, -q.x, -q.y, -q.z)
        } else {
            (q.w, q.x, q.y, q.z)
        };

        let vec_norm = (x * x + y * y + z * z).sqrt();
        let angle = Rad(2.0 * vec_norm.atan2(w));

        if vec_norm < AXIS_NORM_THRESHOLD {
            (Position3D::ZERO, angle)
        } else {
            (
                Position3D::new(x / vec_norm, y / vec_norm, z / vec_norm),
                angle,
            )
        }
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Q({:.3}, {:.3}, {:.3}, {:.3})",
            self.w, self.x, self.y, self.z
        )
    }
}

/// 笛卡尔空间位姿（位置 + 姿态）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianPose {
    /// 位置（米）
    pub position: Position3D,
    /// 姿态（四元数）
    pub orientation: Quaternion,
}

impl CartesianPose {
    /// 从位置和欧拉角创建
    pub fn from_position_euler(x: f64, y: f64, z: f64, roll: Rad, pitch: Rad, yaw: Rad) -> Self {
        CartesianPose {
            position: Position3D::new(x, y, z),
            orientation: Quaternion::from_euler(roll, pitch, yaw),
        }
    }

    /// 从位置和四元数创建
    pub fn from_position_quaternion(position: Position3D, orientation: Quaternion) -> Self {
        CartesianPose {
            position,
            orientation,
        }
    }

    /// 零位姿（原点，无旋转）
    pub const ZERO: Self = CartesianPose {
        position: Position3D::ZERO,
        orientation: Quaternion::IDENTITY,
    };
}

impl fmt::Display for CartesianPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pose(pos: {}, quat: {})",
            self.position, self.orientation
        )
    }
}

/// 笛卡尔空间速度（线速度 + 角速度）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianVelocity {
    /// 线速度（米/秒）
    pub linear: Position3D,
    /// 角速度（弧度/秒）
    pub angular: Position3D,
}

impl CartesianVelocity {
    /// 创建新的笛卡尔速度
    pub fn new(linear: Position3D, angular: Position3D) -> Self {
        CartesianVelocity { linear, angular }
    }

    /// 零速度
    pub const ZERO: Self = CartesianVelocity {
        linear: Position3D::ZERO,
        angular: Position3D::ZERO,
    };
}

/// 带坐标系与新鲜度时间戳的位姿（缓存条目）
///
/// `stamp` 一律记录**本地到达时刻**（`Instant::now()`），而不是消息
/// 自带的时间戳：远端时钟偏移或倒填的时间戳不得被当作新鲜数据。
///
/// 条目不可变：更新缓存时整体替换，读者不会观察到位姿与时间戳
/// 来自两次不同写入的撕裂状态。
#[derive(Debug, Clone)]
pub struct StampedPose {
    /// 位姿（跟踪坐标系下）
    pub pose: CartesianPose,
    /// 所在坐标系名
    pub frame: String,
    /// 本地到达时刻
    pub stamp: Instant,
}

impl StampedPose {
    /// 以当前时刻为新鲜度时间戳创建条目
    pub fn now(pose: CartesianPose, frame: impl Into<String>) -> Self {
        StampedPose {
            pose,
            frame: frame.into(),
            stamp: Instant::now(),
        }
    }

    /// 时间戳年龄是否小于 `timeout`（新鲜）
    pub fn is_fresh(&self, timeout: std::time::Duration) -> bool {
        self.stamp.elapsed() < timeout
    }
}

/// 输出的速度指令消息
///
/// 对应每个控制周期向下游发送的一条消息：坐标系标签 + 线速度 +
/// 角速度 + 发出时刻。下游负责把笛卡尔速度映射到关节运动。
#[derive(Debug, Clone)]
pub struct TwistCommand {
    /// 指令所在坐标系
    pub frame: String,
    /// 笛卡尔速度
    pub twist: CartesianVelocity,
    /// 发出时刻
    pub stamp: SystemTime,
}

impl TwistCommand {
    /// 以当前时刻为时间戳创建指令
    pub fn now(frame: impl Into<String>, twist: CartesianVelocity) -> Self {
        TwistCommand {
            frame: frame.into(),
            twist,
            stamp: SystemTime::now(),
        }
    }
}
