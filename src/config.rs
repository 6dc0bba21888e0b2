// src/config.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactMethod {
    VelocityPeak,
    KinematicChain,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

/// Immutable analysis configuration, passed into the pipeline entry point.
///
/// Thresholds were tuned against recorded reference swings; the presets below
/// cover the common video types (normal speed, slow motion, etc.).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Which contact-detection strategy to run.
    pub contact_method: ContactMethod,
    /// Apply the elbow-extension gate to the forward-swing detector as well.
    pub kinematic_chain_mode: bool,
    /// Derive velocity thresholds from the track's own peak instead of
    /// using the fixed values below.
    pub use_adaptive: bool,
    /// Fraction of the observed peak used as threshold when adaptive is on.
    pub adaptive_percent: f64,
    /// Fixed wrist-speed threshold (normalized units per second).
    pub velocity_threshold: f64,
    /// Fixed shoulder-rotation speed threshold (degrees per second).
    pub rotation_velocity_threshold: f64,
    /// Minimum elbow extension at contact (degrees).
    pub contact_angle_min: f64,
    /// Contact candidates must reach this fraction of the window's peak speed.
    pub peak_tolerance: f64,
    /// Frame tolerance for the hybrid strategy's agreement check.
    pub hybrid_frame_tolerance: usize,
    /// Visibility below this marks a joint sample for interpolation.
    pub visibility_threshold: f64,
    /// Stricter visibility cutoff used for quality scoring.
    pub high_visibility_threshold: f64,
    /// Half-width of the centered window used for velocity smoothing.
    pub smoothing_window: usize,
    /// Consecutive frames a detector condition must hold.
    pub min_sustain_frames: usize,
    /// Contact search window after forward-swing start (frames at 30 fps,
    /// scaled with the actual frame rate).
    pub contact_search_window: usize,
    /// Frames to shift the detected contact forward (scaled with fps).
    pub contact_frame_adjustment: usize,
    /// How far past body center the wrist must travel for follow-through
    /// (normalized x units).
    pub follow_through_threshold: f64,
    /// Which arm holds the racket.
    pub dominant_side: Side,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            contact_method: ContactMethod::KinematicChain,
            kinematic_chain_mode: false,
            use_adaptive: false,
            adaptive_percent: 0.15,
            velocity_threshold: 0.5,
            rotation_velocity_threshold: 30.0,
            contact_angle_min: 150.0,
            peak_tolerance: 0.8,
            hybrid_frame_tolerance: 3,
            visibility_threshold: 0.5,
            high_visibility_threshold: 0.7,
            smoothing_window: 2,
            min_sustain_frames: 3,
            contact_search_window: 60,
            contact_frame_adjustment: 0,
            follow_through_threshold: 0.15,
            dominant_side: Side::Right,
        }
    }
}

impl AnalyzerConfig {
    /// Regular speed videos (30-60 fps).
    pub fn normal_speed() -> Self {
        Self {
            use_adaptive: true,
            adaptive_percent: 0.20,
            contact_angle_min: 130.0,
            follow_through_threshold: 0.15,
            contact_search_window: 45,
            ..Self::default()
        }
    }

    /// Slow-motion videos (120-240 fps).
    pub fn slow_motion() -> Self {
        Self {
            use_adaptive: true,
            adaptive_percent: 0.12,
            contact_angle_min: 115.0,
            follow_through_threshold: 0.08,
            contact_search_window: 80,
            ..Self::default()
        }
    }

    /// Ultra slow-motion videos (480+ fps).
    pub fn ultra_slow_motion() -> Self {
        Self {
            use_adaptive: true,
            adaptive_percent: 0.08,
            contact_angle_min: 110.0,
            follow_through_threshold: 0.06,
            contact_search_window: 120,
            ..Self::default()
        }
    }

    /// Fast, aggressive baseline swings.
    pub fn aggressive() -> Self {
        Self {
            use_adaptive: true,
            adaptive_percent: 0.18,
            contact_angle_min: 125.0,
            follow_through_threshold: 0.12,
            contact_search_window: 50,
            ..Self::default()
        }
    }

    /// Slice shots: less racket speed, less arm extension.
    pub fn slice() -> Self {
        Self {
            use_adaptive: true,
            adaptive_percent: 0.10,
            contact_angle_min: 100.0,
            follow_through_threshold: 0.08,
            contact_search_window: 70,
            ..Self::default()
        }
    }

    /// Look up a preset by name. Returns `None` for unknown names.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "normal" => Some(Self::normal_speed()),
            "slomo" => Some(Self::slow_motion()),
            "ultra_slomo" => Some(Self::ultra_slow_motion()),
            "aggressive" => Some(Self::aggressive()),
            "slice" => Some(Self::slice()),
            _ => None,
        }
    }
}
