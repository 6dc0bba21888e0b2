// src/export.rs
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use csv::Writer;
use serde::Serialize;

use crate::kinematics::KinematicSample;
use crate::metrics::SwingAnalysisResult;

/// One per-frame row of the kinematics CSV.
#[derive(Debug, Serialize)]
struct KinematicRecord {
    frame: usize,
    timestamp: f64,
    wrist_speed: f64,
    wrist_accel: f64,
    elbow_angle: f64,
    shoulder_rotation: f64,
    hip_rotation: f64,
    hip_shoulder_separation: f64,
    wrist_x: f64,
    body_center_x: f64,
    wrist_behind_body: bool,
    visibility: f64,
    low_confidence: bool,
}

/// Writes one analysis session to disk: the per-frame kinematics as CSV and
/// the analysis result as JSON, under `<output_dir>/<session_name>/`.
pub struct SessionExporter {
    output_dir: PathBuf,
    session_name: String,
}

impl SessionExporter {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name
            .unwrap_or_else(|| format!("session_{}", Local::now().format("%Y%m%d_%H%M%S")));
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn export_kinematics_csv(
        &self,
        samples: &[KinematicSample],
        dominant: crate::config::Side,
    ) -> Result<PathBuf> {
        let csv_path = self.session_dir().join("kinematics.csv");
        if let Some(parent) = csv_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&csv_path)?;
        let mut writer = Writer::from_writer(file);
        for s in samples {
            writer.serialize(KinematicRecord {
                frame: s.frame_index,
                timestamp: s.timestamp,
                wrist_speed: s.wrist_speed(dominant),
                wrist_accel: s.wrist_accel,
                elbow_angle: s.elbow_angle,
                shoulder_rotation: s.shoulder_rotation,
                hip_rotation: s.hip_rotation,
                hip_shoulder_separation: s.hip_shoulder_separation,
                wrist_x: s.wrist_x,
                body_center_x: s.body_center_x,
                wrist_behind_body: s.wrist_behind_body,
                visibility: s.visibility,
                low_confidence: s.low_confidence,
            })?;
        }
        writer.flush()?;

        tracing::info!(path = %csv_path.display(), rows = samples.len(), "exported kinematics");
        Ok(csv_path)
    }

    pub fn export_result_json(&self, result: &SwingAnalysisResult) -> Result<PathBuf> {
        let json_path = self.session_dir().join("analysis.json");
        if let Some(parent) = json_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&json_path)?;
        serde_json::to_writer_pretty(file, result)?;
        tracing::info!(path = %json_path.display(), "exported analysis result");
        Ok(json_path)
    }
}
