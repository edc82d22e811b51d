//! Configuration from the environment.

use crate::application::{DetectorFailure, PipelineSettings};
use crate::domain::SamplingMode;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Directory receiving uploaded videos
    pub upload_dir: PathBuf,
    /// Directory for clips and archives, served under `/static`
    pub output_dir: PathBuf,
    /// Detector executable and its arguments
    pub detector_cmd: String,
    pub detector_args: Vec<String>,
    /// Clip codecs passed to ffmpeg
    pub video_codec: String,
    pub audio_codec: String,
    /// Highlight jobs allowed to run at the same time
    pub max_concurrent_jobs: usize,
    /// Finished job directories kept under `output_dir`
    pub max_retained_jobs: usize,
    pub pipeline: PipelineSettings,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let defaults = PipelineSettings::default();

        let pipeline = PipelineSettings {
            confidence_threshold: parse_or(
                &lookup,
                "CONFIDENCE_THRESHOLD",
                defaults.confidence_threshold,
            ),
            sampling_mode: parse_or::<SamplingMode>(
                &lookup,
                "SAMPLING_MODE",
                defaults.sampling_mode,
            ),
            sample_interval: parse_or(
                &lookup,
                "SAMPLE_INTERVAL_SECS",
                defaults.sample_interval,
            ),
            on_detector_failure: parse_or::<DetectorFailure>(
                &lookup,
                "DETECTOR_FAILURE",
                defaults.on_detector_failure,
            ),
            aggregation: defaults.aggregation,
            keep_failed_jobs: parse_or(&lookup, "KEEP_FAILED_JOBS", defaults.keep_failed_jobs),
        };

        Self {
            addr: var("ADDR", "127.0.0.1"),
            port: var("PORT", "8000"),
            upload_dir: PathBuf::from(var("UPLOAD_DIR", "./uploaded_videos")),
            output_dir: PathBuf::from(var("OUTPUT_DIR", "./output_clips")),
            detector_cmd: var("DETECTOR_CMD", "highlights-detector"),
            detector_args: var("DETECTOR_ARGS", "")
                .split_whitespace()
                .map(String::from)
                .collect(),
            video_codec: var("VIDEO_CODEC", "libx264"),
            audio_codec: var("AUDIO_CODEC", "aac"),
            max_concurrent_jobs: parse_or(&lookup, "MAX_CONCURRENT_JOBS", 2usize).max(1),
            max_retained_jobs: parse_or(&lookup, "MAX_RETAINED_JOBS", 20usize).max(1),
            pipeline,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Ignoring {}={:?}: {}", key, raw, e);
            default
        }),
        None => default,
    }
}
