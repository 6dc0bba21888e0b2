// src/kinematics.rs
use nalgebra::Vector3;

use crate::config::{AnalyzerConfig, Side};
use crate::landmarks::{JointId, LandmarkTrack};

/// Velocity of one tracked segment at one frame.
#[derive(Debug, Clone, Copy)]
pub struct SegmentVelocity {
    pub velocity: Vector3<f64>,
    pub speed: f64,
}

impl SegmentVelocity {
    fn zero() -> Self {
        Self {
            velocity: Vector3::zeros(),
            speed: 0.0,
        }
    }
}

/// Segment velocities for one body side.
#[derive(Debug, Clone, Copy)]
pub struct SideKinematics {
    pub wrist: SegmentVelocity,
    pub elbow: SegmentVelocity,
    pub shoulder: SegmentVelocity,
    pub hip: SegmentVelocity,
}

impl SideKinematics {
    fn zero() -> Self {
        Self {
            wrist: SegmentVelocity::zero(),
            elbow: SegmentVelocity::zero(),
            shoulder: SegmentVelocity::zero(),
            hip: SegmentVelocity::zero(),
        }
    }
}

/// Per-frame derived kinematics. Owned by the engine, consumed read-only
/// downstream.
#[derive(Debug, Clone)]
pub struct KinematicSample {
    pub frame_index: usize,
    pub timestamp: f64,
    pub left: SideKinematics,
    pub right: SideKinematics,
    /// Rate of change of the dominant wrist's speed (units/s^2).
    pub wrist_accel: f64,
    /// Elbow flexion of the dominant arm (shoulder-elbow-wrist), degrees.
    pub elbow_angle: f64,
    /// Shoulder-line rotation about the vertical axis, degrees,
    /// counter-clockwise positive seen from above.
    pub shoulder_rotation: f64,
    /// Hip-line rotation, same convention.
    pub hip_rotation: f64,
    /// Shoulder rotation minus hip rotation, degrees.
    pub hip_shoulder_separation: f64,
    /// Rotation speeds, degrees per second.
    pub shoulder_rotation_velocity: f64,
    pub hip_rotation_velocity: f64,
    /// Dominant wrist x and the shoulder-midpoint reference line.
    pub wrist_x: f64,
    pub body_center_x: f64,
    pub wrist_behind_body: bool,
    /// Mean visibility of the required joints at this frame.
    pub visibility: f64,
    /// Any contributing joint was interpolated.
    pub low_confidence: bool,
}

impl KinematicSample {
    pub fn side(&self, side: Side) -> &SideKinematics {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn wrist_speed(&self, side: Side) -> f64 {
        self.side(side).wrist.speed
    }
}

/// Angle at `b` formed by `a-b-c`, in degrees.
pub fn joint_angle(a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>) -> f64 {
    let ba = a - b;
    let bc = c - b;
    let denom = ba.norm() * bc.norm();
    if denom == 0.0 {
        return 0.0;
    }
    let cos = (ba.dot(&bc) / denom).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Rotation of the line between two landmarks about the vertical axis,
/// measured from the depth difference: `atan2(right.z - left.z,
/// right.x - left.x)` in degrees. Negative means the right side is forward.
fn line_rotation(left: Vector3<f64>, right: Vector3<f64>) -> f64 {
    (right.z - left.z).atan2(right.x - left.x).to_degrees()
}

/// Derive velocities, accelerations and joint angles for every frame of the
/// track. One sample per landmark frame, in order.
pub fn compute(track: &LandmarkTrack, config: &AnalyzerConfig) -> Vec<KinematicSample> {
    let frames = track.frames();
    let n = frames.len();
    let w = config.smoothing_window.max(1);

    let (wrist_id, elbow_id, shoulder_id) = match config.dominant_side {
        Side::Left => (JointId::LeftWrist, JointId::LeftElbow, JointId::LeftShoulder),
        Side::Right => (
            JointId::RightWrist,
            JointId::RightElbow,
            JointId::RightShoulder,
        ),
    };

    // Smoothed velocity: centered finite difference over up to +-w frames.
    let segment_velocity = |joint: JointId, i: usize| -> SegmentVelocity {
        let lo = i.saturating_sub(w);
        let hi = (i + w).min(n - 1);
        let dt = frames[hi].timestamp - frames[lo].timestamp;
        if dt <= 0.0 {
            return SegmentVelocity::zero();
        }
        let dp = frames[hi].joint(joint).position - frames[lo].joint(joint).position;
        let velocity = dp / dt;
        SegmentVelocity {
            velocity,
            speed: velocity.norm(),
        }
    };

    let mut samples: Vec<KinematicSample> = Vec::with_capacity(n);
    for (i, frame) in frames.iter().enumerate() {
        let left = SideKinematics {
            wrist: segment_velocity(JointId::LeftWrist, i),
            elbow: segment_velocity(JointId::LeftElbow, i),
            shoulder: segment_velocity(JointId::LeftShoulder, i),
            hip: segment_velocity(JointId::LeftHip, i),
        };
        let right = SideKinematics {
            wrist: segment_velocity(JointId::RightWrist, i),
            elbow: segment_velocity(JointId::RightElbow, i),
            shoulder: segment_velocity(JointId::RightShoulder, i),
            hip: segment_velocity(JointId::RightHip, i),
        };

        let elbow_angle = joint_angle(
            frame.joint(shoulder_id).position,
            frame.joint(elbow_id).position,
            frame.joint(wrist_id).position,
        );
        let shoulder_rotation = line_rotation(
            frame.joint(JointId::LeftShoulder).position,
            frame.joint(JointId::RightShoulder).position,
        );
        let hip_rotation = line_rotation(
            frame.joint(JointId::LeftHip).position,
            frame.joint(JointId::RightHip).position,
        );

        let wrist_x = frame.joint(wrist_id).position.x;
        let body_center_x = (frame.joint(JointId::LeftShoulder).position.x
            + frame.joint(JointId::RightShoulder).position.x)
            / 2.0;
        // For a right-handed player seen from the right, "behind" is the
        // low-x side of the body line; mirrored for lefties.
        let wrist_behind_body = match config.dominant_side {
            Side::Right => wrist_x < body_center_x,
            Side::Left => wrist_x > body_center_x,
        };

        samples.push(KinematicSample {
            frame_index: frame.frame_index,
            timestamp: frame.timestamp,
            left,
            right,
            wrist_accel: 0.0,
            elbow_angle,
            shoulder_rotation,
            hip_rotation,
            hip_shoulder_separation: shoulder_rotation - hip_rotation,
            shoulder_rotation_velocity: 0.0,
            hip_rotation_velocity: 0.0,
            wrist_x,
            body_center_x,
            wrist_behind_body,
            visibility: frame.mean_visibility(),
            low_confidence: frame.any_interpolated(),
        });
    }

    // Second pass: derivatives of quantities computed in the first pass.
    let dominant = config.dominant_side;
    let speeds: Vec<f64> = samples.iter().map(|s| s.wrist_speed(dominant)).collect();
    let shoulder_rots: Vec<f64> = samples.iter().map(|s| s.shoulder_rotation).collect();
    let hip_rots: Vec<f64> = samples.iter().map(|s| s.hip_rotation).collect();
    let timestamps: Vec<f64> = samples.iter().map(|s| s.timestamp).collect();

    let central_diff = |values: &[f64], i: usize| -> f64 {
        let lo = i.saturating_sub(1);
        let hi = (i + 1).min(n - 1);
        let dt = timestamps[hi] - timestamps[lo];
        if dt <= 0.0 {
            0.0
        } else {
            (values[hi] - values[lo]) / dt
        }
    };

    for i in 0..n {
        samples[i].wrist_accel = central_diff(&speeds, i);
        samples[i].shoulder_rotation_velocity = central_diff(&shoulder_rots, i);
        samples[i].hip_rotation_velocity = central_diff(&hip_rots, i);
    }

    samples
}
