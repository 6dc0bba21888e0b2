// src/main.rs
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};

use swing_analyzer::export::SessionExporter;
use swing_analyzer::{AnalyzerConfig, LandmarkTrack, RawTrack, SwingAnalyzer};

struct Args {
    track_path: PathBuf,
    config: AnalyzerConfig,
    export_dir: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut track_path = None;
    let mut config = AnalyzerConfig::default();
    let mut export_dir = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--preset" => {
                let name = args.next().context("--preset needs a name")?;
                config = AnalyzerConfig::preset(&name)
                    .with_context(|| format!("unknown preset '{name}'"))?;
            }
            "--export" => {
                export_dir = Some(PathBuf::from(
                    args.next().context("--export needs a directory")?,
                ));
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other if track_path.is_none() && !other.starts_with('-') => {
                track_path = Some(PathBuf::from(other));
            }
            other => bail!("unexpected argument: {other}"),
        }
    }

    Ok(Args {
        track_path: track_path.context("missing track file argument")?,
        config,
        export_dir,
    })
}

fn print_usage() {
    eprintln!("Usage: swing_analyzer <track.json> [--preset NAME] [--export DIR]");
    eprintln!();
    eprintln!("Presets: default, normal, slomo, ultra_slomo, aggressive, slice");
    eprintln!();
    eprintln!("The track file holds the pose source's output: {{\"fps\": .., \"frames\": [..]}}");
}

fn run() -> Result<()> {
    let args = parse_args()?;

    let file = File::open(&args.track_path)
        .with_context(|| format!("cannot open {}", args.track_path.display()))?;
    let raw: RawTrack = serde_json::from_reader(file)
        .with_context(|| format!("cannot parse {}", args.track_path.display()))?;

    let analyzer = SwingAnalyzer::new(args.config);
    let track = LandmarkTrack::build(&raw.frames, raw.fps, analyzer.config())?;
    let result = analyzer.analyze_track(&track);

    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(dir) = args.export_dir {
        let exporter = SessionExporter::new(dir, None);
        let samples = analyzer.kinematics(&track);
        exporter.export_kinematics_csv(&samples, analyzer.config().dominant_side)?;
        exporter.export_result_json(&result)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
