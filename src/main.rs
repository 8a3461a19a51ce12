//! Headless face mesh overlay runner replaying recorded detections.

use anyhow::{Context, Result};
use clap::Parser;
use facemesh_overlay::{
    app::FramePump,
    config::Config,
    replay::{LoggingRenderer, ReplayDetector, SyntheticVideo},
};
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Recorded detections to replay (YAML list of per-tick face lists)
    #[arg(short, long)]
    recording: Option<String>,

    /// Number of ticks to run
    #[arg(short, long, default_value = "300")]
    frames: u64,

    /// Override the number of pooled mesh slots
    #[arg(short, long)]
    max_faces: Option<usize>,

    /// Fire the capture trigger on this tick
    #[arg(long)]
    capture_at: Option<u64>,

    /// Loop the recording instead of running out of faces
    #[arg(long)]
    looping: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Face Mesh Overlay");

    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    if let Some(max_faces) = args.max_faces {
        config.mesh.max_faces = max_faces;
    }

    let detector = match &args.recording {
        Some(path) => ReplayDetector::from_file(path)
            .with_context(|| format!("Failed to load recording {path}"))?
            .looping(args.looping),
        None => {
            warn!("No recording given; every tick will have zero detections");
            ReplayDetector::default()
        }
    };

    let size = config.camera.video_size;
    let video = SyntheticVideo::new(size, size, config.camera.facing);
    let mut pump = FramePump::new(&config, detector, video, LoggingRenderer::with_history(1))
        .context("Failed to start frame pump")?;

    for tick in 0..args.frames {
        if args.capture_at == Some(tick) {
            match pump.capture() {
                Ok(revision) => info!("Capture applied, UV revision {}", revision),
                Err(e) => warn!("Capture failed: {}", e),
            }
        }
        pump.tick();
    }

    let stats = pump.stats();
    info!(
        "Ran {} ticks: {} detector failures, {} faces dropped, {} malformed faces, {} basis failures",
        stats.ticks, stats.detector_failures, stats.faces_dropped, stats.malformed_faces, stats.basis_failures
    );
    info!("Renderer received {} frames", pump.renderer().frames());

    Ok(())
}
