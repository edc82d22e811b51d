use super::highlights::HighlightWindow;
use serde::Serialize;
use std::path::PathBuf;

/// Archive file name, also the download name offered to clients.
pub const ARCHIVE_NAME: &str = "highlights.zip";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clip {
    pub index: usize,
    pub window: HighlightWindow,
    pub path: PathBuf,
}

impl Clip {
    /// Name of the clip file, also used as its archive entry name.
    pub fn file_name(&self) -> String {
        clip_file_name(self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveResult {
    pub clip_count: usize,
    pub archive_path: PathBuf,
}

impl ArchiveResult {
    pub fn message(&self) -> String {
        format!(
            "Rendering complete. {} highlights were generated.",
            self.clip_count
        )
    }
}

pub fn clip_file_name(index: usize) -> String {
    format!("highlight_{}.mp4", index)
}

/// Clamp a window to the playable range of the source: `[max(start, 0),
/// min(end, duration)]`.
pub fn segment_bounds(window: &HighlightWindow, source_duration: f64) -> (f64, f64) {
    (window.start.max(0.0), window.end.min(source_duration))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_file_name() {
        assert_eq!(clip_file_name(0), "highlight_0.mp4");
        assert_eq!(clip_file_name(12), "highlight_12.mp4");
    }

    #[test]
    fn test_segment_bounds_clamps_to_duration() {
        let window = HighlightWindow {
            start: 33.0,
            end: 50.0,
        };
        assert_eq!(segment_bounds(&window, 45.0), (33.0, 45.0));
        assert_eq!(segment_bounds(&window, 120.0), (33.0, 50.0));
    }

    #[test]
    fn test_segment_bounds_clamps_negative_start() {
        let window = HighlightWindow {
            start: -3.0,
            end: 12.0,
        };
        assert_eq!(segment_bounds(&window, 60.0), (0.0, 12.0));
    }

    #[test]
    fn test_message() {
        let result = ArchiveResult {
            clip_count: 2,
            archive_path: PathBuf::from("out/highlights.zip"),
        };
        assert_eq!(
            result.message(),
            "Rendering complete. 2 highlights were generated."
        );
    }
}
