// src/landmarks.rs
use std::collections::BTreeMap;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;

/// Tracks shorter than this never pass the sufficiency check, regardless of
/// frame rate.
pub const MIN_TRACK_FRAMES: usize = 15;

/// Minimum span of usable footage, in seconds.
pub const MIN_TRACK_SECONDS: f64 = 0.5;

/// The joints required for swing analysis, with their canonical pose-model
/// landmark indices.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum JointId {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
}

impl JointId {
    pub const ALL: [JointId; 8] = [
        JointId::LeftShoulder,
        JointId::RightShoulder,
        JointId::LeftElbow,
        JointId::RightElbow,
        JointId::LeftWrist,
        JointId::RightWrist,
        JointId::LeftHip,
        JointId::RightHip,
    ];

    /// Index of this joint in the upstream pose model's landmark list.
    pub fn landmark_index(self) -> usize {
        match self {
            JointId::LeftShoulder => 11,
            JointId::RightShoulder => 12,
            JointId::LeftElbow => 13,
            JointId::RightElbow => 14,
            JointId::LeftWrist => 15,
            JointId::RightWrist => 16,
            JointId::LeftHip => 23,
            JointId::RightHip => 24,
        }
    }

    fn slot(self) -> usize {
        match self {
            JointId::LeftShoulder => 0,
            JointId::RightShoulder => 1,
            JointId::LeftElbow => 2,
            JointId::RightElbow => 3,
            JointId::LeftWrist => 4,
            JointId::RightWrist => 5,
            JointId::LeftHip => 6,
            JointId::RightHip => 7,
        }
    }
}

/// One joint reading at one frame. Coordinates are normalized to the image
/// frame; visibility is the pose source's confidence in [0, 1].
#[derive(Debug, Clone, Copy)]
pub struct JointSample {
    pub position: Vector3<f64>,
    pub visibility: f64,
    /// Position was filled in from neighboring frames because visibility was
    /// below the configured threshold.
    pub interpolated: bool,
}

/// All required joints at one frame. Immutable once built.
#[derive(Debug, Clone)]
pub struct LandmarkFrame {
    pub frame_index: usize,
    pub timestamp: f64,
    joints: [JointSample; 8],
}

impl LandmarkFrame {
    pub fn joint(&self, id: JointId) -> &JointSample {
        &self.joints[id.slot()]
    }

    /// Mean visibility across the required joints.
    pub fn mean_visibility(&self) -> f64 {
        self.joints.iter().map(|j| j.visibility).sum::<f64>() / self.joints.len() as f64
    }

    /// True when every required joint clears the given visibility cutoff.
    pub fn all_joints_visible(&self, threshold: f64) -> bool {
        self.joints.iter().all(|j| j.visibility >= threshold)
    }

    /// True when any required joint's position was interpolated.
    pub fn any_interpolated(&self) -> bool {
        self.joints.iter().any(|j| j.interpolated)
    }
}

/// Input contract: one joint as produced by the pose source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawJoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    pub visibility: f64,
}

/// Input contract: one frame of joint readings in capture order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFrame {
    pub joints: BTreeMap<JointId, RawJoint>,
}

/// Input contract: the full extracted track for one swing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTrack {
    pub fps: f64,
    pub frames: Vec<RawFrame>,
}

/// Time-ordered, normalized landmark track. Frame indices are compacted to
/// `0..len` after rejected frames are dropped; timestamps follow as
/// `frame_index / fps`.
#[derive(Debug, Clone)]
pub struct LandmarkTrack {
    frames: Vec<LandmarkFrame>,
    fps: f64,
}

impl LandmarkTrack {
    /// Build a track from raw pose output.
    ///
    /// Frames missing any required joint are rejected outright. Joints below
    /// the visibility threshold keep their frame but have their positions
    /// linearly interpolated between the nearest confident neighbors (held at
    /// the boundaries). Fails when too few usable frames remain.
    pub fn build(
        raw_frames: &[RawFrame],
        fps: f64,
        config: &AnalyzerConfig,
    ) -> Result<Self, AnalysisError> {
        if !(fps > 0.0) || !fps.is_finite() {
            return Err(AnalysisError::InvalidFrameRate(fps));
        }

        // Keep only frames where every required joint was reported.
        let complete: Vec<&RawFrame> = raw_frames
            .iter()
            .filter(|f| JointId::ALL.iter().all(|id| f.joints.contains_key(id)))
            .collect();

        let usable = complete
            .iter()
            .filter(|f| {
                JointId::ALL
                    .iter()
                    .all(|id| f.joints[id].visibility >= config.visibility_threshold)
            })
            .count();

        let required = MIN_TRACK_FRAMES.max((MIN_TRACK_SECONDS * fps).ceil() as usize);
        if usable < required {
            return Err(AnalysisError::InsufficientTrack { usable, required });
        }

        let mut frames: Vec<LandmarkFrame> = complete
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let mut joints = [JointSample {
                    position: Vector3::zeros(),
                    visibility: 0.0,
                    interpolated: false,
                }; 8];
                for id in JointId::ALL {
                    let j = &raw.joints[&id];
                    joints[id.slot()] = JointSample {
                        position: Vector3::new(j.x, j.y, j.z),
                        visibility: j.visibility,
                        interpolated: j.visibility < config.visibility_threshold,
                    };
                }
                LandmarkFrame {
                    frame_index: i,
                    timestamp: i as f64 / fps,
                    joints,
                }
            })
            .collect();

        interpolate_low_visibility(&mut frames, config.visibility_threshold);

        tracing::debug!(
            frames = frames.len(),
            usable,
            fps,
            "built landmark track"
        );

        Ok(Self { frames, fps })
    }

    pub fn frames(&self) -> &[LandmarkFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }
}

/// Replace low-visibility joint positions with a linear blend of the nearest
/// confident readings of the same joint. Boundary gaps hold the nearest valid
/// sample.
fn interpolate_low_visibility(frames: &mut [LandmarkFrame], threshold: f64) {
    for id in JointId::ALL {
        let slot = id.slot();
        let valid: Vec<usize> = frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.joints[slot].visibility >= threshold)
            .map(|(i, _)| i)
            .collect();
        if valid.is_empty() {
            // Nothing to anchor on; raw positions stay, still flagged.
            continue;
        }

        for i in 0..frames.len() {
            if frames[i].joints[slot].visibility >= threshold {
                continue;
            }
            let prev = valid.iter().rev().find(|&&v| v < i).copied();
            let next = valid.iter().find(|&&v| v > i).copied();
            let position = match (prev, next) {
                (Some(p), Some(n)) => {
                    let t = (i - p) as f64 / (n - p) as f64;
                    let a = frames[p].joints[slot].position;
                    let b = frames[n].joints[slot].position;
                    a + (b - a) * t
                }
                (Some(p), None) => frames[p].joints[slot].position,
                (None, Some(n)) => frames[n].joints[slot].position,
                (None, None) => unreachable!("valid is non-empty"),
            };
            frames[i].joints[slot].position = position;
        }
    }
}
