// tests/pipeline.rs
//
// End-to-end pipeline tests over a synthetic right-handed forehand built
// from raw landmark positions, exercising track normalization, kinematics,
// phase sequencing, kinetic chain scoring and metrics aggregation together.

use std::collections::BTreeMap;

use swing_analyzer::{
    AnalysisError, AnalyzerConfig, JointId, RawFrame, RawJoint, RawTrack, SwingAnalyzer,
};

const FRAMES: usize = 120;
const FPS: f64 = 30.0;

fn joint(x: f64, y: f64, z: f64) -> RawJoint {
    RawJoint {
        x,
        y,
        z,
        visibility: 0.9,
    }
}

/// Right shoulder depth over the swing: coil from frame 10, hold, decoil
/// from frame 49. The left shoulder mirrors it.
fn shoulder_z(i: usize) -> f64 {
    match i {
        0..=9 => 0.0,
        10..=30 => -0.25 * (i - 10) as f64 / 20.0,
        31..=48 => -0.25,
        49..=59 => -0.25 + 0.40 * (i - 49) as f64 / 10.0,
        _ => 0.15,
    }
}

/// Right hip depth: a shallower coil that starts and decoils slightly before
/// the shoulders, giving the proximal-to-distal chain order.
fn hip_z(i: usize) -> f64 {
    match i {
        0..=7 => 0.0,
        8..=28 => -0.10 * (i - 8) as f64 / 20.0,
        29..=45 => -0.10,
        46..=56 => -0.10 + 0.20 * (i - 46) as f64 / 10.0,
        _ => 0.10,
    }
}

/// Dominant wrist x per frame: idle, take-back to 0.30, a short pause at the
/// deepest point, quadratic acceleration through contact, then deceleration
/// into the follow-through.
fn wrist_xs() -> Vec<f64> {
    let mut xs = Vec::with_capacity(FRAMES);
    let mut x = 0.62;
    for i in 0..FRAMES {
        if (15..45).contains(&i) {
            x -= 0.32 / 30.0;
        } else if (48..=61).contains(&i) {
            x += 0.003 * (i - 47) as f64;
        } else if i >= 62 {
            x += (0.042 - 0.003 * (i - 61) as f64).max(0.0);
        }
        xs.push(x);
    }
    xs
}

fn swing_track() -> RawTrack {
    let xs = wrist_xs();
    let frames = (0..FRAMES)
        .map(|i| {
            let sz = shoulder_z(i);
            let hz = hip_z(i);
            let rs = (0.60, 0.30, sz);
            let rw = (xs[i], 0.42, 0.0);

            let mut joints = BTreeMap::new();
            joints.insert(JointId::LeftShoulder, joint(0.40, 0.30, -sz));
            joints.insert(JointId::RightShoulder, joint(rs.0, rs.1, rs.2));
            joints.insert(JointId::LeftHip, joint(0.42, 0.55, -hz));
            joints.insert(JointId::RightHip, joint(0.58, 0.55, hz));
            joints.insert(JointId::LeftElbow, joint(0.35, 0.40, 0.0));
            joints.insert(JointId::LeftWrist, joint(0.33, 0.48, 0.0));
            // Straight hitting arm: the elbow rides the shoulder-wrist line.
            joints.insert(
                JointId::RightElbow,
                joint(
                    (rs.0 + rw.0) / 2.0,
                    (rs.1 + rw.1) / 2.0,
                    (rs.2 + rw.2) / 2.0,
                ),
            );
            joints.insert(JointId::RightWrist, joint(rw.0, rw.1, rw.2));
            RawFrame { joints }
        })
        .collect();
    RawTrack { fps: FPS, frames }
}

#[test]
fn full_swing_detects_all_phases_in_order() {
    let analyzer = SwingAnalyzer::with_defaults();
    let result = analyzer.analyze(&swing_track()).unwrap();

    assert_eq!(result.phases_detected(), 5, "{:?}", result.phases);

    let frames: Vec<usize> = result
        .phases
        .iter()
        .map(|e| e.frame_index.unwrap())
        .collect();
    for pair in frames.windows(2) {
        assert!(pair[0] <= pair[1], "phase order violated: {frames:?}");
    }
    for event in result.phases.iter() {
        assert!(event.frame_index.unwrap() < FRAMES);
        assert!((0.0..=1.0).contains(&event.confidence));
        assert!(event.reason.is_none());
    }

    // The straight hitting arm satisfies the extension gate, so contact is a
    // clean kinematic hit, not a velocity-peak fallback.
    assert!(result.phases.contact.confidence > 0.8);
    assert!(result.overall_confidence() > 0.5);
}

#[test]
fn tempo_and_engine_metrics_follow_the_timeline() {
    let analyzer = SwingAnalyzer::with_defaults();
    let result = analyzer.analyze(&swing_track()).unwrap();

    let tempo = &result.tempo;
    assert!(tempo.backswing_duration.unwrap() > 0.5);
    assert!(tempo.forward_swing_duration.unwrap() > 0.0);
    // A deliberate take-back and a quick strike: rhythm well above 1.
    assert!(tempo.swing_rhythm_ratio.unwrap() > 1.0);

    let engine = &result.engine;
    // Shoulders coil to roughly -68 degrees before the forward swing.
    assert!(engine.max_shoulder_rotation.unwrap().value.abs() > 60.0);
    assert!(engine.max_hip_rotation.unwrap().value.abs() > 20.0);
    let separation = engine.hip_shoulder_separation.unwrap();
    assert!(separation.value.abs() > 10.0);
    assert_eq!(separation.frame, result.phases.backswing.frame_index.unwrap());
}

#[test]
fn kinetic_chain_fires_hips_before_wrist() {
    let analyzer = SwingAnalyzer::with_defaults();
    let result = analyzer.analyze(&swing_track()).unwrap();

    let chain = &result.kinetic_chain;
    assert!(
        chain.peak_velocity_sequence.hip.peak_frame
            <= chain.peak_velocity_sequence.wrist.peak_frame
    );
    assert!((0.0..=1.0).contains(&chain.confidence));
    for point in chain.peak_velocity_sequence.ordered() {
        assert!(point.peak_frame < FRAMES);
        assert!(point.peak_velocity >= 0.0);
    }
}

#[test]
fn clean_capture_scores_full_tracking_quality() {
    let analyzer = SwingAnalyzer::with_defaults();
    let result = analyzer.analyze(&swing_track()).unwrap();

    let quality = &result.tracking_quality;
    assert!((quality.detection_rate - 1.0).abs() < 1e-9);
    assert!((quality.average_confidence - 0.9).abs() < 1e-9);
    assert!(!quality.low_quality);
}

#[test]
fn degraded_visibility_lowers_quality_but_still_analyzes() {
    let mut track = swing_track();
    // Lose the left elbow late in the follow-through for 20 frames.
    for frame in &mut track.frames[70..90] {
        frame
            .joints
            .get_mut(&JointId::LeftElbow)
            .unwrap()
            .visibility = 0.2;
    }

    let analyzer = SwingAnalyzer::with_defaults();
    let result = analyzer.analyze(&track).unwrap();

    assert!(result.tracking_quality.detection_rate < 1.0);
    assert!(!result.tracking_quality.low_quality);
    assert!(result.phases.contact.detected);
    assert!(result.phases.follow_through.detected);
}

#[test]
fn analysis_is_deterministic() {
    let track = swing_track();
    let analyzer = SwingAnalyzer::with_defaults();
    let a = analyzer.analyze(&track).unwrap();
    let b = analyzer.analyze(&track).unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn analyze_frames_matches_the_track_entry_point() {
    let track = swing_track();
    let analyzer = SwingAnalyzer::with_defaults();
    let from_track = analyzer.analyze(&track).unwrap();
    let from_frames = analyzer.analyze_frames(&track.frames, track.fps).unwrap();
    assert_eq!(
        serde_json::to_string(&from_track).unwrap(),
        serde_json::to_string(&from_frames).unwrap()
    );
}

#[test]
fn short_track_is_rejected() {
    let mut track = swing_track();
    track.frames.truncate(10);
    let analyzer = SwingAnalyzer::with_defaults();
    match analyzer.analyze(&track) {
        Err(AnalysisError::InsufficientTrack { usable, required }) => {
            assert_eq!(usable, 10);
            assert!(required > 10);
        }
        other => panic!("expected insufficient-track error, got {other:?}"),
    }
}

#[test]
fn result_serializes_to_the_output_contract() {
    let analyzer = SwingAnalyzer::with_defaults();
    let result = analyzer.analyze(&swing_track()).unwrap();
    let value = serde_json::to_value(&result).unwrap();

    for key in ["phases", "engine", "tempo", "kinetic_chain", "tracking_quality"] {
        assert!(value.get(key).is_some(), "missing output block {key}");
    }
    for phase in [
        "unit_turn",
        "backswing",
        "forward_swing",
        "contact",
        "follow_through",
    ] {
        let event = &value["phases"][phase];
        assert!(event["detected"].as_bool().unwrap(), "{phase} not detected");
        assert!(event["frame_index"].is_u64());
    }
    assert!(value["kinetic_chain"]["confidence"].is_number());
}

#[test]
fn velocity_peak_preset_also_resolves_contact() {
    let config = AnalyzerConfig {
        contact_method: swing_analyzer::ContactMethod::VelocityPeak,
        ..AnalyzerConfig::default()
    };
    let analyzer = SwingAnalyzer::new(config);
    let result = analyzer.analyze(&swing_track()).unwrap();
    assert!(result.phases.contact.detected);

    let hybrid = SwingAnalyzer::new(AnalyzerConfig {
        contact_method: swing_analyzer::ContactMethod::Hybrid,
        ..AnalyzerConfig::default()
    });
    let hybrid_result = hybrid.analyze(&swing_track()).unwrap();
    assert!(hybrid_result.phases.contact.detected);
    // Both point at the strike zone around the speed peak.
    let a = result.phases.contact.frame_index.unwrap() as i64;
    let b = hybrid_result.phases.contact.frame_index.unwrap() as i64;
    assert!((a - b).abs() <= 5, "contact frames diverged: {a} vs {b}");
}
