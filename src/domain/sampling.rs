//! Frame sampling cadence.
//!
//! The sampler reads one frame, runs detection on it, then decides where the
//! cursor goes next. With the adaptive policy that decision depends on the
//! detection outcome, so the policy changes which timestamps end up in the
//! event stream and therefore where highlight windows begin and end.

use std::str::FromStr;

/// Nominal sampling interval in seconds.
pub const DEFAULT_SAMPLE_INTERVAL: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Jump ahead only after a frame with detections, otherwise step one frame.
    Adaptive,
    /// Jump ahead after every sampled frame.
    Fixed,
}

impl FromStr for SamplingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adaptive" => Ok(SamplingMode::Adaptive),
            "fixed" => Ok(SamplingMode::Fixed),
            other => Err(format!("unknown sampling mode '{}'", other)),
        }
    }
}

/// Sampling policy resolved against a concrete frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPolicy {
    pub mode: SamplingMode,
    /// Frames to jump on a coarse step. Always at least one.
    pub frame_skip: u64,
}

impl SamplingPolicy {
    /// `frame_skip = round(frame_rate * interval)`, never below one frame.
    pub fn for_frame_rate(mode: SamplingMode, frame_rate: f64, interval: f64) -> Self {
        let skip = (frame_rate * interval).round();
        let frame_skip = if skip.is_finite() && skip >= 1.0 {
            skip as u64
        } else {
            1
        };
        Self { mode, frame_skip }
    }

    /// Index of the next frame to read after the frame at `current`.
    pub fn next_position(&self, current: u64, detected: bool) -> u64 {
        match self.mode {
            SamplingMode::Adaptive if !detected => current + 1,
            _ => current + self.frame_skip,
        }
    }
}
