// src/lib.rs
//! Tennis swing phase detection and biomechanical metrics.
//!
//! Takes a time-ordered track of pose landmarks (produced upstream by a pose
//! estimator) and derives the five canonical swing phases, rotation "engine"
//! metrics, tempo, a kinetic-chain sequencing score, and a tracking-quality
//! summary. The whole pipeline is a pure synchronous pass over one track and
//! is safe to run concurrently for independent tracks.

pub mod analyzer;
pub mod chain;
pub mod config;
pub mod detectors;
pub mod error;
pub mod export;
pub mod kinematics;
pub mod landmarks;
pub mod metrics;
pub mod sequencer;

pub use analyzer::SwingAnalyzer;
pub use config::{AnalyzerConfig, ContactMethod, Side};
pub use detectors::{DetectionFailure, PhaseEvent, SwingPhase};
pub use error::AnalysisError;
pub use landmarks::{JointId, LandmarkTrack, RawFrame, RawJoint, RawTrack};
pub use metrics::SwingAnalysisResult;
