// src/chain.rs
use serde::Serialize;

use crate::config::AnalyzerConfig;
use crate::kinematics::KinematicSample;
use crate::sequencer::PhaseTimeline;

/// Body segments in expected proximal-to-distal firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Hip,
    Shoulder,
    Elbow,
    Wrist,
}

/// Peak-velocity moment for one segment. Hip and shoulder peaks are measured
/// on rotation speed (deg/s), elbow and wrist on linear speed.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct KineticChainPoint {
    pub segment: Segment,
    pub peak_frame: usize,
    pub peak_timestamp: f64,
    pub peak_velocity: f64,
}

/// Peak sequence keyed by segment, matching the output contract.
#[derive(Debug, Clone, Serialize)]
pub struct ChainSequence {
    pub hip: KineticChainPoint,
    pub shoulder: KineticChainPoint,
    pub elbow: KineticChainPoint,
    pub wrist: KineticChainPoint,
}

impl ChainSequence {
    pub fn ordered(&self) -> [&KineticChainPoint; 4] {
        [&self.hip, &self.shoulder, &self.elbow, &self.wrist]
    }
}

/// Lag times (seconds) between consecutive segment peaks. Negative values
/// mean the distal segment fired first.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChainLag {
    pub hip_to_shoulder: f64,
    pub shoulder_to_elbow: f64,
    pub elbow_to_wrist: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct KineticChainMetrics {
    pub peak_velocity_sequence: ChainSequence,
    pub chain_lag: ChainLag,
    pub confidence: f64,
}

// A lag longer than this fraction of the whole swing is implausible and
// costs confidence.
const MAX_PLAUSIBLE_LAG_FRACTION: f64 = 0.5;
const IMPLAUSIBLE_LAG_PENALTY: f64 = 0.15;

/// Locate per-segment velocity peaks inside the overall swing window and
/// score how well their ordering matches hip -> shoulder -> elbow -> wrist.
///
/// Imperfect sequencing is expected in real swings; it lowers the confidence
/// score rather than failing the analysis.
pub fn analyze(
    samples: &[KinematicSample],
    timeline: &PhaseTimeline,
    config: &AnalyzerConfig,
) -> KineticChainMetrics {
    if samples.is_empty() {
        return empty_metrics();
    }
    let last = samples.len() - 1;
    let start = timeline.unit_turn.frame_index.unwrap_or(0).min(last);
    let end = timeline
        .follow_through
        .frame_index
        .unwrap_or(last)
        .min(last)
        .max(start);
    let window = &samples[start..=end];

    let side = config.dominant_side;
    let peak = |segment: Segment| -> KineticChainPoint {
        let value = |s: &KinematicSample| match segment {
            Segment::Hip => s.hip_rotation_velocity.abs(),
            Segment::Shoulder => s.shoulder_rotation_velocity.abs(),
            Segment::Elbow => s.side(side).elbow.speed,
            Segment::Wrist => s.side(side).wrist.speed,
        };
        // First maximum wins ties, keeping the result deterministic.
        let best = window
            .iter()
            .fold(None::<&KinematicSample>, |acc, s| match acc {
                Some(a) if value(a) >= value(s) => Some(a),
                _ => Some(s),
            })
            .expect("window is non-empty");
        KineticChainPoint {
            segment,
            peak_frame: best.frame_index,
            peak_timestamp: best.timestamp,
            peak_velocity: value(best),
        }
    };

    let sequence = ChainSequence {
        hip: peak(Segment::Hip),
        shoulder: peak(Segment::Shoulder),
        elbow: peak(Segment::Elbow),
        wrist: peak(Segment::Wrist),
    };

    let chain_lag = ChainLag {
        hip_to_shoulder: sequence.shoulder.peak_timestamp - sequence.hip.peak_timestamp,
        shoulder_to_elbow: sequence.elbow.peak_timestamp - sequence.shoulder.peak_timestamp,
        elbow_to_wrist: sequence.wrist.peak_timestamp - sequence.elbow.peak_timestamp,
    };

    let confidence = score_sequence(&sequence, &chain_lag, samples);

    KineticChainMetrics {
        peak_velocity_sequence: sequence,
        chain_lag,
        confidence,
    }
}

/// Metrics for a track with no samples: zeroed peaks, zero confidence.
fn empty_metrics() -> KineticChainMetrics {
    let point = |segment| KineticChainPoint {
        segment,
        peak_frame: 0,
        peak_timestamp: 0.0,
        peak_velocity: 0.0,
    };
    KineticChainMetrics {
        peak_velocity_sequence: ChainSequence {
            hip: point(Segment::Hip),
            shoulder: point(Segment::Shoulder),
            elbow: point(Segment::Elbow),
            wrist: point(Segment::Wrist),
        },
        chain_lag: ChainLag {
            hip_to_shoulder: 0.0,
            shoulder_to_elbow: 0.0,
            elbow_to_wrist: 0.0,
        },
        confidence: 0.0,
    }
}

fn score_sequence(
    sequence: &ChainSequence,
    lag: &ChainLag,
    samples: &[KinematicSample],
) -> f64 {
    let points = sequence.ordered();
    let holds = points
        .windows(2)
        .filter(|pair| pair[0].peak_frame <= pair[1].peak_frame)
        .count();
    let mut confidence = holds as f64 / 3.0;

    let swing_duration = samples
        .last()
        .map(|s| s.timestamp)
        .unwrap_or(0.0);
    if swing_duration > 0.0 {
        let max_lag = swing_duration * MAX_PLAUSIBLE_LAG_FRACTION;
        for l in [lag.hip_to_shoulder, lag.shoulder_to_elbow, lag.elbow_to_wrist] {
            if l > max_lag {
                confidence -= IMPLAUSIBLE_LAG_PENALTY;
            }
        }
    }

    confidence.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::{DetectionFailure, PhaseEvent, SwingPhase};
    use crate::kinematics::{SegmentVelocity, SideKinematics};
    use nalgebra::Vector3;

    fn neutral(frame: usize) -> KinematicSample {
        let still = SideKinematics {
            wrist: SegmentVelocity {
                velocity: Vector3::zeros(),
                speed: 0.0,
            },
            elbow: SegmentVelocity {
                velocity: Vector3::zeros(),
                speed: 0.0,
            },
            shoulder: SegmentVelocity {
                velocity: Vector3::zeros(),
                speed: 0.0,
            },
            hip: SegmentVelocity {
                velocity: Vector3::zeros(),
                speed: 0.0,
            },
        };
        KinematicSample {
            frame_index: frame,
            timestamp: frame as f64 / 30.0,
            left: still,
            right: still,
            wrist_accel: 0.0,
            elbow_angle: 90.0,
            shoulder_rotation: 0.0,
            hip_rotation: 0.0,
            hip_shoulder_separation: 0.0,
            shoulder_rotation_velocity: 0.0,
            hip_rotation_velocity: 0.0,
            wrist_x: 0.6,
            body_center_x: 0.5,
            wrist_behind_body: false,
            visibility: 0.9,
            low_confidence: false,
        }
    }

    fn undetected_timeline() -> PhaseTimeline {
        PhaseTimeline {
            unit_turn: PhaseEvent::missed(
                SwingPhase::UnitTurn,
                DetectionFailure::NoSustainedRotation,
            ),
            backswing: PhaseEvent::missed(
                SwingPhase::Backswing,
                DetectionFailure::InsufficientWristTravel,
            ),
            forward_swing: PhaseEvent::missed(
                SwingPhase::ForwardSwing,
                DetectionFailure::NoVelocityPeak,
            ),
            contact: PhaseEvent::missed(SwingPhase::Contact, DetectionFailure::NoVelocityPeak),
            follow_through: PhaseEvent::missed(
                SwingPhase::FollowThrough,
                DetectionFailure::NeverCrossedCenter,
            ),
        }
    }

    fn chained_samples(hip_peak: usize, shoulder_peak: usize) -> Vec<KinematicSample> {
        let mut samples: Vec<KinematicSample> = (0..120).map(neutral).collect();
        samples[hip_peak].hip_rotation_velocity = 245.3;
        samples[shoulder_peak].shoulder_rotation_velocity = 312.1;
        samples[99].right.elbow.speed = 4.2;
        samples[102].right.wrist.speed = 6.1;
        samples
    }

    #[test]
    fn proper_ordering_scores_full_confidence_minus_lag_penalties() {
        let samples = chained_samples(65, 67);
        let config = AnalyzerConfig::default();
        let metrics = analyze(&samples, &undetected_timeline(), &config);

        assert_eq!(metrics.peak_velocity_sequence.hip.peak_frame, 65);
        assert_eq!(metrics.peak_velocity_sequence.shoulder.peak_frame, 67);
        assert_eq!(metrics.peak_velocity_sequence.elbow.peak_frame, 99);
        assert_eq!(metrics.peak_velocity_sequence.wrist.peak_frame, 102);
        assert!((metrics.chain_lag.hip_to_shoulder - 2.0 / 30.0).abs() < 1e-9);
        assert!(metrics.confidence > 0.0);
        assert!(metrics.confidence <= 1.0);
    }

    #[test]
    fn reversed_hip_shoulder_ordering_lowers_confidence() {
        let config = AnalyzerConfig::default();
        let correct = analyze(&chained_samples(65, 67), &undetected_timeline(), &config);
        let reversed = analyze(&chained_samples(67, 65), &undetected_timeline(), &config);

        assert!(
            reversed.confidence < correct.confidence,
            "reversed {} vs correct {}",
            reversed.confidence,
            correct.confidence
        );
        assert!(reversed.confidence >= 0.0);
        assert!(reversed.chain_lag.hip_to_shoulder < 0.0);
    }

    #[test]
    fn window_respects_detected_phase_bounds() {
        let mut samples = chained_samples(65, 67);
        // A huge wrist spike before the swing window must be ignored.
        samples[5].right.wrist.speed = 99.0;
        let mut timeline = undetected_timeline();
        timeline.unit_turn = PhaseEvent::found(SwingPhase::UnitTurn, &samples[40], 0.9);
        let config = AnalyzerConfig::default();
        let metrics = analyze(&samples, &timeline, &config);
        assert_eq!(metrics.peak_velocity_sequence.wrist.peak_frame, 102);
    }

    #[test]
    fn empty_sample_slice_yields_zero_confidence() {
        let config = AnalyzerConfig::default();
        let metrics = analyze(&[], &undetected_timeline(), &config);
        assert_eq!(metrics.confidence, 0.0);
        assert_eq!(metrics.peak_velocity_sequence.wrist.peak_velocity, 0.0);
        assert_eq!(metrics.chain_lag.hip_to_shoulder, 0.0);
    }

    #[test]
    fn out_of_range_timeline_frames_are_clamped() {
        let samples = chained_samples(65, 67);
        let mut timeline = undetected_timeline();
        timeline.follow_through = PhaseEvent {
            phase: SwingPhase::FollowThrough,
            detected: true,
            frame_index: Some(500),
            timestamp: Some(500.0 / 30.0),
            confidence: 0.9,
            reason: None,
        };
        let config = AnalyzerConfig::default();
        let metrics = analyze(&samples, &timeline, &config);
        assert_eq!(metrics.peak_velocity_sequence.wrist.peak_frame, 102);
    }

    #[test]
    fn implausibly_long_lag_is_penalized() {
        let config = AnalyzerConfig::default();
        // Elbow/wrist peaks very late relative to a compact hip/shoulder pair.
        let compact = analyze(&chained_samples(60, 62), &undetected_timeline(), &config);
        let mut stretched = chained_samples(2, 4);
        stretched[99].right.elbow.speed = 0.0;
        stretched[119].right.elbow.speed = 4.2;
        let late = analyze(&stretched, &undetected_timeline(), &config);
        assert!(late.confidence < compact.confidence);
    }
}
