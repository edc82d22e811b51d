use crate::domain::{Detection, Frame, HighlightError};
use crate::ports::Detector;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::warn;

/// Minimum confidence for a detection to count.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// What to do when the detector fails on a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorFailure {
    /// Fail the whole job.
    Abort,
    /// Treat the frame as having no detections.
    Skip,
}

impl FromStr for DetectorFailure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(DetectorFailure::Abort),
            "skip" => Ok(DetectorFailure::Skip),
            other => Err(format!("unknown detector failure policy '{}'", other)),
        }
    }
}

/// Runs the shared detector on single frames and keeps confident results.
pub struct DetectionAdapter<'a, D: Detector> {
    detector: &'a Mutex<D>,
    threshold: f32,
    on_failure: DetectorFailure,
}

impl<'a, D: Detector> DetectionAdapter<'a, D> {
    pub fn new(detector: &'a Mutex<D>, threshold: f32, on_failure: DetectorFailure) -> Self {
        Self {
            detector,
            threshold,
            on_failure,
        }
    }

    pub fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, HighlightError> {
        let result = {
            let mut detector = self
                .detector
                .lock()
                .map_err(|_| HighlightError::processing("Detector is unavailable after a panic"))?;
            detector.detect(frame, self.threshold)
        };

        match result {
            Ok(detections) => Ok(detections
                .into_iter()
                .filter(|d| d.confidence >= self.threshold)
                .collect()),
            Err(e) => match self.on_failure {
                DetectorFailure::Abort => Err(HighlightError::processing(format!(
                    "Detector failed: {}",
                    e
                ))),
                DetectorFailure::Skip => {
                    warn!("Detector failed, skipping frame: {}", e);
                    Ok(Vec::new())
                }
            },
        }
    }
}
