use std::error::Error;
use std::path::Path;

/// Writes a time range of a source video to a new file.
#[cfg_attr(test, mockall::automock)]
pub trait ClipEncoder: Send + Sync {
    /// Re-encode `[start, end)` seconds of `source` into `output`.
    fn encode_segment(
        &self,
        source: &Path,
        start: f64,
        end: f64,
        output: &Path,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}
