// src/error.rs
use thiserror::Error;

/// Fatal analysis errors. Per-phase non-detection and undefined metrics are
/// recorded in the result, never raised.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("not enough usable frames for analysis: {usable} usable, need at least {required}")]
    InsufficientTrack { usable: usize, required: usize },

    #[error("invalid frame rate: {0} (must be > 0)")]
    InvalidFrameRate(f64),
}
