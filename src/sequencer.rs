// src/sequencer.rs
use serde::Serialize;

use crate::config::AnalyzerConfig;
use crate::detectors::{
    self, ContactStrategy, PhaseEvent, SwingPhase, Thresholds,
};
use crate::kinematics::KinematicSample;

/// The resolved phase timeline: one event per canonical phase, detected or
/// not. Serializes to the `phases` block of the output contract.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseTimeline {
    pub unit_turn: PhaseEvent,
    pub backswing: PhaseEvent,
    pub forward_swing: PhaseEvent,
    pub contact: PhaseEvent,
    pub follow_through: PhaseEvent,
}

impl PhaseTimeline {
    pub fn get(&self, phase: SwingPhase) -> &PhaseEvent {
        match phase {
            SwingPhase::UnitTurn => &self.unit_turn,
            SwingPhase::Backswing => &self.backswing,
            SwingPhase::ForwardSwing => &self.forward_swing,
            SwingPhase::Contact => &self.contact,
            SwingPhase::FollowThrough => &self.follow_through,
        }
    }

    /// Events in canonical phase order.
    pub fn iter(&self) -> impl Iterator<Item = &PhaseEvent> {
        SwingPhase::ORDER.iter().map(|p| self.get(*p))
    }

    pub fn detected_count(&self) -> usize {
        self.iter().filter(|e| e.detected).count()
    }
}

/// Drives the five detectors strictly in canonical order. Each phase searches
/// only from the previous detected phase's frame onward; an undetected phase
/// leaves the lower bound where it was instead of aborting the pipeline.
pub struct PhaseSequencer<'a> {
    samples: &'a [KinematicSample],
    fps: f64,
    thresholds: Thresholds,
    config: &'a AnalyzerConfig,
    contact: Box<dyn ContactStrategy>,
}

impl<'a> PhaseSequencer<'a> {
    pub fn new(samples: &'a [KinematicSample], fps: f64, config: &'a AnalyzerConfig) -> Self {
        let thresholds = Thresholds::resolve(samples, config);
        Self {
            samples,
            fps,
            thresholds,
            config,
            contact: detectors::strategy_for(config.contact_method),
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn run(&self) -> PhaseTimeline {
        // Ties between adjacent phases are allowed in degenerate fast swings,
        // so the bound is inclusive and only moves on detection.
        fn advance(lower: &mut usize, event: &PhaseEvent) {
            if let Some(frame) = event.frame_index {
                *lower = frame;
            }
        }

        let mut lower = 0usize;

        let unit_turn = detectors::detect_unit_turn(self.samples, lower, &self.thresholds, self.config);
        advance(&mut lower, &unit_turn);

        let backswing = detectors::detect_backswing(self.samples, lower, self.config);
        advance(&mut lower, &backswing);

        let forward_swing =
            detectors::detect_forward_swing(self.samples, lower, &self.thresholds, self.config);
        advance(&mut lower, &forward_swing);
        let contact_start = lower;

        let window_len =
            (self.config.contact_search_window as f64 * self.fps / 30.0).round() as usize;
        let contact = self.contact.detect(
            self.samples,
            contact_start..contact_start.saturating_add(window_len.max(1)),
            self.fps,
            &self.thresholds,
            self.config,
        );
        advance(&mut lower, &contact);

        let follow_through = detectors::detect_follow_through(self.samples, lower, self.config);

        let timeline = PhaseTimeline {
            unit_turn,
            backswing,
            forward_swing,
            contact,
            follow_through,
        };
        for event in timeline.iter() {
            tracing::debug!(
                phase = event.phase.name(),
                detected = event.detected,
                frame = ?event.frame_index,
                confidence = event.confidence,
                "phase resolved"
            );
        }
        tracing::info!(
            detected = timeline.detected_count(),
            "phase sequencing complete"
        );
        timeline
    }
}
