//! Highlights server
//!
//! Wires up:
//! - ffmpeg decoding and clip encoding
//! - the detector process, loaded once for every job
//! - the HTTP inbound adapter

use highlights::adapters::detector::ProcessDetector;
use highlights::adapters::ffmpeg::{FfmpegCliEncoder, FfmpegOpener};
use highlights::adapters::http::{router, AppState};
use highlights::application::WorkspaceRetention;
use highlights::{HighlightPipeline, ServiceConfig};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = ServiceConfig::from_env();

    tracing_subscriber::fmt::init();

    if let Err(e) = ffmpeg_next::init() {
        error!("Failed to initialize ffmpeg: {}", e);
        std::process::exit(1);
    }

    for dir in [&config.upload_dir, &config.output_dir] {
        if let Err(e) = std::fs::create_dir_all(dir) {
            error!("Failed to create {:?}: {}", dir, e);
            std::process::exit(1);
        }
    }

    // 1. Adapters
    let detector = match ProcessDetector::spawn(&config.detector_cmd, &config.detector_args) {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to start detector {:?}: {}", config.detector_cmd, e);
            std::process::exit(1);
        }
    };
    let encoder = FfmpegCliEncoder::new(&config.video_codec, &config.audio_codec);

    // 2. Application
    let pipeline = HighlightPipeline::new(FfmpegOpener, detector, encoder, config.pipeline);

    // 3. HTTP Layer
    let state = Arc::new(AppState {
        runner: Arc::new(pipeline),
        upload_dir: config.upload_dir.clone(),
        workspaces: WorkspaceRetention::new(&config.output_dir, config.max_retained_jobs),
        jobs: Arc::new(Semaphore::new(config.max_concurrent_jobs)),
    });
    let app = router(state);

    // 4. Start Server
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.addr, config.port))
        .await
        .expect("Failed to bind TCP listener");
    info!("Listening at {}:{}", config.addr, config.port);
    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
