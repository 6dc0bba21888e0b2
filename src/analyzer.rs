// src/analyzer.rs
use crate::chain;
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::kinematics::{self, KinematicSample};
use crate::landmarks::{LandmarkTrack, RawFrame, RawTrack};
use crate::metrics::{self, SwingAnalysisResult};
use crate::sequencer::PhaseSequencer;

/// Pipeline entry point. Holds only the immutable configuration, so one
/// analyzer can be shared across threads and reused for independent tracks.
pub struct SwingAnalyzer {
    config: AnalyzerConfig,
}

impl SwingAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        tracing::info!(
            contact_method = ?config.contact_method,
            use_adaptive = config.use_adaptive,
            velocity_threshold = config.velocity_threshold,
            contact_angle_min = config.contact_angle_min,
            "swing analyzer configured"
        );
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(AnalyzerConfig::default())
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Normalize raw pose output into a track and analyze it.
    pub fn analyze(&self, raw: &RawTrack) -> Result<SwingAnalysisResult, AnalysisError> {
        let track = LandmarkTrack::build(&raw.frames, raw.fps, &self.config)?;
        Ok(self.analyze_track(&track))
    }

    /// Analyze raw frames with an explicit frame rate.
    pub fn analyze_frames(
        &self,
        frames: &[RawFrame],
        fps: f64,
    ) -> Result<SwingAnalysisResult, AnalysisError> {
        let track = LandmarkTrack::build(frames, fps, &self.config)?;
        Ok(self.analyze_track(&track))
    }

    /// Run the full pipeline over an already-built track: kinematics, phase
    /// sequencing, kinetic chain, metrics. Pure and deterministic.
    pub fn analyze_track(&self, track: &LandmarkTrack) -> SwingAnalysisResult {
        tracing::info!(
            frames = track.len(),
            fps = track.fps(),
            "analyzing swing"
        );

        let samples = kinematics::compute(track, &self.config);
        let timeline = PhaseSequencer::new(&samples, track.fps(), &self.config).run();
        let kinetic_chain = chain::analyze(&samples, &timeline, &self.config);
        let result = metrics::aggregate(track, &samples, timeline, kinetic_chain, &self.config);

        tracing::info!(
            phases_detected = result.phases_detected(),
            overall_confidence = result.overall_confidence(),
            chain_confidence = result.kinetic_chain.confidence,
            "analysis complete"
        );
        result
    }

    /// Derived per-frame kinematics, exposed for export and visualization.
    pub fn kinematics(&self, track: &LandmarkTrack) -> Vec<KinematicSample> {
        kinematics::compute(track, &self.config)
    }
}
