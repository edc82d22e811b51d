use crate::domain::{Detection, Frame};
use std::error::Error;

/// External object detector.
///
/// Implementations may hold model or device state between calls but must not
/// retain the frame.
#[cfg_attr(test, mockall::automock)]
pub trait Detector: Send {
    /// Detect objects on `frame`, reporting entries with confidence at or
    /// above `threshold`.
    fn detect(
        &mut self,
        frame: &Frame,
        threshold: f32,
    ) -> Result<Vec<Detection>, Box<dyn Error + Send + Sync>>;
}
