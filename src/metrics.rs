// src/metrics.rs
use serde::Serialize;

use crate::chain::KineticChainMetrics;
use crate::config::AnalyzerConfig;
use crate::kinematics::KinematicSample;
use crate::landmarks::LandmarkTrack;
use crate::sequencer::PhaseTimeline;

/// Forward-swing durations below this (seconds) make the rhythm ratio
/// undefined rather than astronomically large.
pub const MIN_SWING_DURATION: f64 = 1e-3;

/// A metric value pinned to the frame where it occurred.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ValueAtFrame {
    pub value: f64,
    pub frame: usize,
    pub timestamp: f64,
}

/// Rotation-based "engine" metrics, in degrees.
#[derive(Debug, Clone, Serialize)]
pub struct EngineMetrics {
    pub hip_shoulder_separation: Option<ValueAtFrame>,
    pub max_shoulder_rotation: Option<ValueAtFrame>,
    pub max_hip_rotation: Option<ValueAtFrame>,
}

/// Swing timing metrics, in seconds.
#[derive(Debug, Clone, Serialize)]
pub struct TempoMetrics {
    pub backswing_duration: Option<f64>,
    pub forward_swing_duration: Option<f64>,
    pub swing_rhythm_ratio: Option<f64>,
}

/// How reliably the pose source tracked the subject.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingQuality {
    pub detection_rate: f64,
    pub high_confidence_rate: f64,
    pub average_confidence: f64,
    /// Advisory flag; never blocks computation.
    pub low_quality: bool,
}

/// The complete analysis output, built once per track.
#[derive(Debug, Clone, Serialize)]
pub struct SwingAnalysisResult {
    pub phases: PhaseTimeline,
    pub engine: EngineMetrics,
    pub tempo: TempoMetrics,
    pub kinetic_chain: KineticChainMetrics,
    pub tracking_quality: TrackingQuality,
}

impl SwingAnalysisResult {
    pub fn phases_detected(&self) -> usize {
        self.phases.detected_count()
    }

    /// Mean confidence across detected phases, 0.0 when none detected.
    pub fn overall_confidence(&self) -> f64 {
        let detected: Vec<f64> = self
            .phases
            .iter()
            .filter(|e| e.detected)
            .map(|e| e.confidence)
            .collect();
        if detected.is_empty() {
            0.0
        } else {
            detected.iter().sum::<f64>() / detected.len() as f64
        }
    }
}

/// Assemble the final result from the pipeline's intermediate products.
pub fn aggregate(
    track: &LandmarkTrack,
    samples: &[KinematicSample],
    phases: PhaseTimeline,
    kinetic_chain: KineticChainMetrics,
    config: &AnalyzerConfig,
) -> SwingAnalysisResult {
    let engine = engine_metrics(samples, &phases);
    let tempo = tempo_metrics(&phases);
    let tracking_quality = tracking_quality(track, config);

    SwingAnalysisResult {
        phases,
        engine,
        tempo,
        kinetic_chain,
        tracking_quality,
    }
}

fn at_frame(samples: &[KinematicSample], i: usize, value: f64) -> ValueAtFrame {
    ValueAtFrame {
        value,
        frame: samples[i].frame_index,
        timestamp: samples[i].timestamp,
    }
}

fn engine_metrics(samples: &[KinematicSample], phases: &PhaseTimeline) -> EngineMetrics {
    let hip_shoulder_separation = phases.backswing.frame_index.map(|f| {
        at_frame(samples, f, samples[f].hip_shoulder_separation)
    });

    // Backswing window: from the start of coiling to the start of the
    // forward swing, falling back to the track bounds.
    let lo = phases.unit_turn.frame_index.unwrap_or(0);
    let hi = phases
        .forward_swing
        .frame_index
        .unwrap_or(samples.len() - 1)
        .max(lo);

    let max_by_abs = |value: &dyn Fn(&KinematicSample) -> f64| -> Option<ValueAtFrame> {
        let mut best: Option<(usize, f64)> = None;
        for i in lo..=hi {
            let v = value(&samples[i]);
            if best.map_or(true, |(_, b)| v.abs() > b.abs()) {
                best = Some((i, v));
            }
        }
        best.map(|(i, v)| at_frame(samples, i, v))
    };

    EngineMetrics {
        hip_shoulder_separation,
        max_shoulder_rotation: max_by_abs(&|s| s.shoulder_rotation),
        max_hip_rotation: max_by_abs(&|s| s.hip_rotation),
    }
}

fn tempo_metrics(phases: &PhaseTimeline) -> TempoMetrics {
    let backswing_duration = match (phases.unit_turn.timestamp, phases.forward_swing.timestamp) {
        (Some(start), Some(end)) if end >= start => Some(end - start),
        _ => None,
    };
    let forward_swing_duration = match (phases.forward_swing.timestamp, phases.contact.timestamp) {
        (Some(start), Some(end)) if end >= start => Some(end - start),
        _ => None,
    };
    let swing_rhythm_ratio = match (backswing_duration, forward_swing_duration) {
        (Some(b), Some(f)) if f >= MIN_SWING_DURATION => Some(b / f),
        _ => None,
    };
    TempoMetrics {
        backswing_duration,
        forward_swing_duration,
        swing_rhythm_ratio,
    }
}

fn tracking_quality(track: &LandmarkTrack, config: &AnalyzerConfig) -> TrackingQuality {
    let frames = track.frames();
    let total = frames.len();
    if total == 0 {
        return TrackingQuality {
            detection_rate: 0.0,
            high_confidence_rate: 0.0,
            average_confidence: 0.0,
            low_quality: true,
        };
    }

    let detected = frames
        .iter()
        .filter(|f| f.all_joints_visible(config.visibility_threshold))
        .count();
    let high_confidence = frames
        .iter()
        .filter(|f| f.all_joints_visible(config.high_visibility_threshold))
        .count();
    let average_confidence =
        frames.iter().map(|f| f.mean_visibility()).sum::<f64>() / total as f64;

    let detection_rate = detected as f64 / total as f64;
    TrackingQuality {
        detection_rate,
        high_confidence_rate: high_confidence as f64 / total as f64,
        average_confidence,
        low_quality: detection_rate < 0.7,
    }
}
