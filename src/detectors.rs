// src/detectors.rs
use std::ops::Range;

use serde::Serialize;

use crate::config::{AnalyzerConfig, ContactMethod, Side};
use crate::kinematics::KinematicSample;

/// The five canonical swing phases, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingPhase {
    UnitTurn,
    Backswing,
    ForwardSwing,
    Contact,
    FollowThrough,
}

impl SwingPhase {
    pub const ORDER: [SwingPhase; 5] = [
        SwingPhase::UnitTurn,
        SwingPhase::Backswing,
        SwingPhase::ForwardSwing,
        SwingPhase::Contact,
        SwingPhase::FollowThrough,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SwingPhase::UnitTurn => "unit_turn",
            SwingPhase::Backswing => "backswing",
            SwingPhase::ForwardSwing => "forward_swing",
            SwingPhase::Contact => "contact",
            SwingPhase::FollowThrough => "follow_through",
        }
    }
}

/// Why a detector came up empty. Recorded on the event instead of erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionFailure {
    NoSustainedRotation,
    InsufficientWristTravel,
    NoVelocityPeak,
    AngleNeverReached,
    NeverCrossedCenter,
    EmptySearchWindow,
}

/// Outcome of one phase detector.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseEvent {
    pub phase: SwingPhase,
    pub detected: bool,
    pub frame_index: Option<usize>,
    pub timestamp: Option<f64>,
    pub confidence: f64,
    pub reason: Option<DetectionFailure>,
}

impl PhaseEvent {
    pub fn found(phase: SwingPhase, sample: &KinematicSample, confidence: f64) -> Self {
        Self {
            phase,
            detected: true,
            frame_index: Some(sample.frame_index),
            timestamp: Some(sample.timestamp),
            confidence: confidence.clamp(0.0, 1.0),
            reason: None,
        }
    }

    pub fn missed(phase: SwingPhase, reason: DetectionFailure) -> Self {
        Self {
            phase,
            detected: false,
            frame_index: None,
            timestamp: None,
            confidence: 0.0,
            reason: Some(reason),
        }
    }
}

/// Resolved detection thresholds for one track. With `use_adaptive` these
/// scale with the track's own peaks, which keeps detection stable across
/// slow-motion footage and varying camera distances.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub wrist_velocity: f64,
    pub rotation_velocity: f64,
}

impl Thresholds {
    pub fn resolve(samples: &[KinematicSample], config: &AnalyzerConfig) -> Self {
        if !config.use_adaptive {
            return Self {
                wrist_velocity: config.velocity_threshold,
                rotation_velocity: config.rotation_velocity_threshold,
            };
        }

        let side = config.dominant_side;
        let max_speed = samples
            .iter()
            .map(|s| s.wrist_speed(side))
            .fold(0.0_f64, f64::max);
        let max_rotation = samples
            .iter()
            .map(|s| s.shoulder_rotation_velocity.abs())
            .fold(0.0_f64, f64::max);

        let wrist_velocity = if max_speed > 0.0 {
            max_speed * config.adaptive_percent
        } else {
            config.velocity_threshold
        };
        let rotation_velocity = if max_rotation > 0.0 {
            max_rotation * config.adaptive_percent
        } else {
            config.rotation_velocity_threshold
        };

        tracing::debug!(
            max_speed,
            wrist_velocity,
            rotation_velocity,
            "resolved adaptive thresholds"
        );

        Self {
            wrist_velocity,
            rotation_velocity,
        }
    }
}

// Base confidence margins for the contact strategies. A clean kinematic-chain
// hit outranks a plain velocity peak, which outranks the fallbacks.
const CONTACT_KINEMATIC_MARGIN: f64 = 1.0;
const CONTACT_PEAK_MARGIN: f64 = 0.7;
const CONTACT_FALLBACK_MARGIN: f64 = 0.55;
const CONTACT_HYBRID_DISAGREE_MARGIN: f64 = 0.5;

// Reference wrist travel (normalized x units) for full backswing confidence.
const FULL_BACKSWING_TRAVEL: f64 = 0.1;

/// Margin above threshold and frame visibility, folded into one score.
fn event_confidence(margin: f64, sample: &KinematicSample) -> f64 {
    let visibility = if sample.low_confidence {
        sample.visibility * 0.8
    } else {
        sample.visibility
    };
    (0.6 * margin.clamp(0.0, 1.0) + 0.4 * visibility.clamp(0.0, 1.0)).clamp(0.0, 1.0)
}

/// Unit turn: first frame where shoulder rotation speed stays above threshold
/// for `min_sustain_frames` consecutive frames.
pub fn detect_unit_turn(
    samples: &[KinematicSample],
    start: usize,
    thresholds: &Thresholds,
    config: &AnalyzerConfig,
) -> PhaseEvent {
    if start >= samples.len() {
        return PhaseEvent::missed(SwingPhase::UnitTurn, DetectionFailure::EmptySearchWindow);
    }
    let need = config.min_sustain_frames.max(1);
    let mut run = 0;
    let mut run_start = start;
    for i in start..samples.len() {
        if samples[i].shoulder_rotation_velocity.abs() > thresholds.rotation_velocity {
            if run == 0 {
                run_start = i;
            }
            run += 1;
            if run >= need {
                let s = &samples[run_start];
                let margin = (s.shoulder_rotation_velocity.abs() - thresholds.rotation_velocity)
                    / thresholds.rotation_velocity.max(1e-9);
                return PhaseEvent::found(
                    SwingPhase::UnitTurn,
                    s,
                    event_confidence(margin, s),
                );
            }
        } else {
            run = 0;
        }
    }
    PhaseEvent::missed(SwingPhase::UnitTurn, DetectionFailure::NoSustainedRotation)
}

fn behind_displacement(sample: &KinematicSample, side: Side) -> f64 {
    match side {
        Side::Right => sample.body_center_x - sample.wrist_x,
        Side::Left => sample.wrist_x - sample.body_center_x,
    }
}

/// Backswing: the frame of maximum wrist displacement behind the body-center
/// line within the window.
pub fn detect_backswing(
    samples: &[KinematicSample],
    start: usize,
    config: &AnalyzerConfig,
) -> PhaseEvent {
    if start >= samples.len() {
        return PhaseEvent::missed(SwingPhase::Backswing, DetectionFailure::EmptySearchWindow);
    }
    let side = config.dominant_side;
    let best = samples[start..]
        .iter()
        .filter(|s| s.wrist_behind_body)
        .max_by(|a, b| {
            behind_displacement(a, side)
                .partial_cmp(&behind_displacement(b, side))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    match best {
        Some(s) => {
            let margin = behind_displacement(s, side) / FULL_BACKSWING_TRAVEL;
            PhaseEvent::found(SwingPhase::Backswing, s, event_confidence(margin, s))
        }
        None => PhaseEvent::missed(
            SwingPhase::Backswing,
            DetectionFailure::InsufficientWristTravel,
        ),
    }
}

/// Forward swing: first frame after the backswing where wrist speed exceeds
/// the threshold while still accelerating, sustained for
/// `min_sustain_frames`. With `kinematic_chain_mode` the frame must also pass
/// a relaxed elbow-extension gate.
pub fn detect_forward_swing(
    samples: &[KinematicSample],
    start: usize,
    thresholds: &Thresholds,
    config: &AnalyzerConfig,
) -> PhaseEvent {
    if start >= samples.len() {
        return PhaseEvent::missed(SwingPhase::ForwardSwing, DetectionFailure::EmptySearchWindow);
    }
    let side = config.dominant_side;
    let gate_angle = 0.8 * config.contact_angle_min;
    let velocity_ok = |s: &KinematicSample| {
        s.wrist_speed(side) > thresholds.wrist_velocity && s.wrist_accel > 0.0
    };
    let gated_ok = |s: &KinematicSample| {
        velocity_ok(s) && (!config.kinematic_chain_mode || s.elbow_angle >= gate_angle)
    };

    if let Some(i) = sustained_run(samples, start, config.min_sustain_frames, &gated_ok) {
        let s = &samples[i];
        let margin = (s.wrist_speed(side) - thresholds.wrist_velocity)
            / thresholds.wrist_velocity.max(1e-9);
        return PhaseEvent::found(SwingPhase::ForwardSwing, s, event_confidence(margin, s));
    }

    // Distinguish "never fast enough" from "fast but arm never extended".
    let reason = if config.kinematic_chain_mode
        && sustained_run(samples, start, config.min_sustain_frames, &velocity_ok).is_some()
    {
        DetectionFailure::AngleNeverReached
    } else {
        DetectionFailure::NoVelocityPeak
    };
    PhaseEvent::missed(SwingPhase::ForwardSwing, reason)
}

/// First index where `cond` holds for `need` consecutive frames.
fn sustained_run(
    samples: &[KinematicSample],
    start: usize,
    need: usize,
    cond: &dyn Fn(&KinematicSample) -> bool,
) -> Option<usize> {
    let need = need.max(1);
    let mut run = 0;
    let mut run_start = start;
    for i in start..samples.len() {
        if cond(&samples[i]) {
            if run == 0 {
                run_start = i;
            }
            run += 1;
            if run >= need {
                return Some(run_start);
            }
        } else {
            run = 0;
        }
    }
    None
}

/// Follow-through: first frame after contact where the wrist has crossed the
/// body-center reference on the side opposite the backswing, with
/// decelerating speed.
pub fn detect_follow_through(
    samples: &[KinematicSample],
    start: usize,
    config: &AnalyzerConfig,
) -> PhaseEvent {
    if start >= samples.len() {
        return PhaseEvent::missed(
            SwingPhase::FollowThrough,
            DetectionFailure::EmptySearchWindow,
        );
    }
    for s in &samples[start..] {
        let overshoot = match config.dominant_side {
            Side::Right => s.wrist_x - (s.body_center_x + config.follow_through_threshold),
            Side::Left => (s.body_center_x - config.follow_through_threshold) - s.wrist_x,
        };
        if overshoot >= 0.0 && s.wrist_accel <= 0.0 {
            let margin = 0.5 + overshoot / config.follow_through_threshold.max(1e-9);
            return PhaseEvent::found(SwingPhase::FollowThrough, s, event_confidence(margin, s));
        }
    }
    PhaseEvent::missed(
        SwingPhase::FollowThrough,
        DetectionFailure::NeverCrossedCenter,
    )
}

/// One interchangeable contact-detection strategy.
pub trait ContactStrategy {
    fn detect(
        &self,
        samples: &[KinematicSample],
        window: Range<usize>,
        fps: f64,
        thresholds: &Thresholds,
        config: &AnalyzerConfig,
    ) -> PhaseEvent;
}

pub fn strategy_for(method: ContactMethod) -> Box<dyn ContactStrategy> {
    match method {
        ContactMethod::VelocityPeak => Box::new(VelocityPeakContact),
        ContactMethod::KinematicChain => Box::new(KinematicChainContact),
        ContactMethod::Hybrid => Box::new(HybridContact),
    }
}

fn clamp_window(window: &Range<usize>, len: usize) -> Range<usize> {
    window.start.min(len)..window.end.min(len)
}

/// Index of the maximum wrist speed in the window (first on ties).
fn peak_speed_frame(samples: &[KinematicSample], window: &Range<usize>, side: Side) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for i in window.clone() {
        let speed = samples[i].wrist_speed(side);
        if best.map_or(true, |(_, b)| speed > b) {
            best = Some((i, speed));
        }
    }
    best.map(|(i, _)| i)
}

/// Shift the detected frame forward to account for the ball meeting the
/// strings slightly after peak racket speed. Scaled with frame rate.
fn adjust_contact_frame(i: usize, len: usize, fps: f64, config: &AnalyzerConfig) -> usize {
    let shift = (config.contact_frame_adjustment as f64 * fps / 30.0).round() as usize;
    (i + shift).min(len.saturating_sub(1))
}

/// Contact = frame of maximum wrist speed in the search window.
pub struct VelocityPeakContact;

impl ContactStrategy for VelocityPeakContact {
    fn detect(
        &self,
        samples: &[KinematicSample],
        window: Range<usize>,
        fps: f64,
        _thresholds: &Thresholds,
        config: &AnalyzerConfig,
    ) -> PhaseEvent {
        let window = clamp_window(&window, samples.len());
        match peak_speed_frame(samples, &window, config.dominant_side) {
            Some(i) => {
                let i = adjust_contact_frame(i, samples.len(), fps, config);
                let s = &samples[i];
                PhaseEvent::found(
                    SwingPhase::Contact,
                    s,
                    event_confidence(CONTACT_PEAK_MARGIN, s),
                )
            }
            None => PhaseEvent::missed(SwingPhase::Contact, DetectionFailure::NoVelocityPeak),
        }
    }
}

/// First frame inside the window whose wrist speed is within tolerance of the
/// window peak while the arm is extended past `contact_angle_min`.
fn kinematic_candidate(
    samples: &[KinematicSample],
    window: &Range<usize>,
    thresholds: &Thresholds,
    config: &AnalyzerConfig,
) -> Option<usize> {
    let side = config.dominant_side;
    let peak = peak_speed_frame(samples, window, side)?;
    let floor = samples[peak].wrist_speed(side) * config.peak_tolerance;
    samples[window.clone()]
        .iter()
        .position(|s| {
            s.wrist_speed(side) >= floor
                && s.wrist_speed(side) > thresholds.wrist_velocity
                && s.elbow_angle >= config.contact_angle_min
                && !s.wrist_behind_body
        })
        .map(|offset| window.start + offset)
}

/// Contact = first near-peak frame with the arm sufficiently extended,
/// falling back to the pure velocity peak when the angle gate never passes.
pub struct KinematicChainContact;

impl ContactStrategy for KinematicChainContact {
    fn detect(
        &self,
        samples: &[KinematicSample],
        window: Range<usize>,
        fps: f64,
        thresholds: &Thresholds,
        config: &AnalyzerConfig,
    ) -> PhaseEvent {
        let window = clamp_window(&window, samples.len());
        if let Some(i) = kinematic_candidate(samples, &window, thresholds, config) {
            let i = adjust_contact_frame(i, samples.len(), fps, config);
            let s = &samples[i];
            return PhaseEvent::found(
                SwingPhase::Contact,
                s,
                event_confidence(CONTACT_KINEMATIC_MARGIN, s),
            );
        }
        // Arm extension never qualified; the velocity peak alone still marks
        // the most plausible contact frame, at lower confidence.
        match peak_speed_frame(samples, &window, config.dominant_side) {
            Some(i) => {
                let i = adjust_contact_frame(i, samples.len(), fps, config);
                let s = &samples[i];
                PhaseEvent::found(
                    SwingPhase::Contact,
                    s,
                    event_confidence(CONTACT_FALLBACK_MARGIN, s),
                )
            }
            None => PhaseEvent::missed(SwingPhase::Contact, DetectionFailure::NoVelocityPeak),
        }
    }
}

/// Runs both strategies; agreement promotes the kinematic result, otherwise
/// the velocity peak wins at reduced confidence.
pub struct HybridContact;

impl ContactStrategy for HybridContact {
    fn detect(
        &self,
        samples: &[KinematicSample],
        window: Range<usize>,
        fps: f64,
        thresholds: &Thresholds,
        config: &AnalyzerConfig,
    ) -> PhaseEvent {
        let window = clamp_window(&window, samples.len());
        let peak = peak_speed_frame(samples, &window, config.dominant_side);
        let kc = kinematic_candidate(samples, &window, thresholds, config);
        match (kc, peak) {
            (Some(k), Some(p)) if k.abs_diff(p) <= config.hybrid_frame_tolerance => {
                let i = adjust_contact_frame(k, samples.len(), fps, config);
                let s = &samples[i];
                PhaseEvent::found(
                    SwingPhase::Contact,
                    s,
                    event_confidence(CONTACT_KINEMATIC_MARGIN, s),
                )
            }
            (_, Some(p)) => {
                let i = adjust_contact_frame(p, samples.len(), fps, config);
                let s = &samples[i];
                PhaseEvent::found(
                    SwingPhase::Contact,
                    s,
                    event_confidence(CONTACT_HYBRID_DISAGREE_MARGIN, s),
                )
            }
            (_, None) => PhaseEvent::missed(SwingPhase::Contact, DetectionFailure::NoVelocityPeak),
        }
    }
}
