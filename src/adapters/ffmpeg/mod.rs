//! FFmpeg adapters: libavformat decoding for sampling, the ffmpeg CLI for
//! clip encoding.

pub mod encoder;
pub mod video;

pub use encoder::FfmpegCliEncoder;
pub use video::{FfmpegOpener, FfmpegVideo};
