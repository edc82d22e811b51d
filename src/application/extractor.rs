use crate::domain::clips::{clip_file_name, segment_bounds};
use crate::domain::{Clip, HighlightError, HighlightWindow};
use crate::ports::ClipEncoder;
use std::path::Path;
use tracing::info;

/// Cuts highlight windows out of one source video.
///
/// The source duration is probed once per job and reused for every window.
pub struct ClipExtractor<'a, E: ClipEncoder> {
    encoder: &'a E,
    source: &'a Path,
    source_duration: f64,
    clips_dir: &'a Path,
}

impl<'a, E: ClipEncoder> ClipExtractor<'a, E> {
    pub fn new(
        encoder: &'a E,
        source: &'a Path,
        source_duration: f64,
        clips_dir: &'a Path,
    ) -> Self {
        Self {
            encoder,
            source,
            source_duration,
            clips_dir,
        }
    }

    /// Write the clip for `window` as `highlight_<index>.mp4`.
    pub fn extract(&self, index: usize, window: &HighlightWindow) -> Result<Clip, HighlightError> {
        let (start, end) = segment_bounds(window, self.source_duration);
        if end <= start {
            return Err(HighlightError::encoding(format!(
                "Highlight {} ({:.2}s-{:.2}s) lies outside the video ({:.2}s)",
                index, window.start, window.end, self.source_duration
            )));
        }

        let path = self.clips_dir.join(clip_file_name(index));
        self.encoder
            .encode_segment(self.source, start, end, &path)
            .map_err(|e| {
                HighlightError::encoding(format!("Failed to write highlight {}: {}", index, e))
            })?;

        info!("Highlight {} written to {:?} ({:.2}s-{:.2}s)", index, path, start, end);

        Ok(Clip {
            index,
            window: *window,
            path,
        })
    }

    /// Extract every window in order, stopping at the first failure.
    pub fn extract_all(&self, windows: &[HighlightWindow]) -> Result<Vec<Clip>, HighlightError> {
        windows
            .iter()
            .enumerate()
            .map(|(index, window)| self.extract(index, window))
            .collect()
    }
}
