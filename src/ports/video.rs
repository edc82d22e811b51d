use crate::domain::Frame;
use std::error::Error;
use std::path::Path;

/// A decoded video with a forward-only frame cursor.
///
/// Positions are frame indices. A cursor is owned by exactly one scan and is
/// never shared between jobs.
pub trait SeekableVideo {
    /// Frames per second.
    fn frame_rate(&self) -> f64;

    /// Duration in seconds.
    fn duration(&self) -> f64;

    /// Index of the frame the next `read_frame` returns.
    fn position(&self) -> u64;

    /// Decode the frame at the cursor and advance by one.
    /// Returns `None` once the video is exhausted.
    fn read_frame(&mut self) -> Result<Option<(Frame, f64)>, Box<dyn Error + Send + Sync>>;

    /// Move the cursor to `frame_index`. Only forward moves are required.
    fn seek(&mut self, frame_index: u64) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Opens videos from disk.
pub trait VideoOpener: Send + Sync {
    type Video: SeekableVideo;

    fn open(&self, path: &Path) -> Result<Self::Video, Box<dyn Error + Send + Sync>>;
}
