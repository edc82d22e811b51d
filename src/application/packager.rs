//! Bundles clips into the downloadable archive.
//!
//! Entries are appended to `<archive>.partial` as clips are produced. Only a
//! complete archive is renamed to its final path, so a failed job never leaves
//! a truncated archive where clients look for one.

use crate::domain::{ArchiveResult, Clip, HighlightError};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub struct ArchiveWriter {
    writer: ZipWriter<File>,
    partial_path: PathBuf,
    final_path: PathBuf,
    clip_count: usize,
}

pub fn partial_path(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

fn archive_error(path: &Path, err: impl std::fmt::Display) -> HighlightError {
    HighlightError::encoding(format!("Failed to write archive {:?}: {}", path, err))
}

impl ArchiveWriter {
    pub fn create(final_path: &Path) -> Result<Self, HighlightError> {
        let partial_path = partial_path(final_path);
        let file = File::create(&partial_path).map_err(|e| archive_error(&partial_path, e))?;

        Ok(Self {
            writer: ZipWriter::new(file),
            partial_path,
            final_path: final_path.to_path_buf(),
            clip_count: 0,
        })
    }

    pub fn clip_count(&self) -> usize {
        self.clip_count
    }

    /// Append a clip file under its own file name.
    pub fn append(&mut self, clip: &Clip) -> Result<(), HighlightError> {
        // Clips are already compressed video.
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let mut source = File::open(&clip.path).map_err(|e| archive_error(&clip.path, e))?;

        self.writer
            .start_file(clip.file_name(), options)
            .map_err(|e| archive_error(&self.partial_path, e))?;
        io::copy(&mut source, &mut self.writer).map_err(|e| archive_error(&self.partial_path, e))?;

        self.clip_count += 1;
        debug!("Added {} to archive", clip.file_name());
        Ok(())
    }

    /// Finish the archive and move it to its final path.
    pub fn publish(mut self) -> Result<ArchiveResult, HighlightError> {
        self.writer
            .finish()
            .map_err(|e| archive_error(&self.partial_path, e))?;
        std::fs::rename(&self.partial_path, &self.final_path)
            .map_err(|e| archive_error(&self.final_path, e))?;

        Ok(ArchiveResult {
            clip_count: self.clip_count,
            archive_path: self.final_path,
        })
    }

    /// Close the archive without publishing it. The partial archive keeps the
    /// entries appended so far and its path is returned.
    pub fn abandon(mut self) -> PathBuf {
        if let Err(e) = self.writer.finish() {
            warn!("Could not close partial archive {:?}: {}", self.partial_path, e);
        }
        self.partial_path
    }
}

/// Package already-written clips in one go.
pub fn package(clips: &[Clip], archive_path: &Path) -> Result<ArchiveResult, HighlightError> {
    let mut writer = ArchiveWriter::create(archive_path)?;
    for clip in clips {
        if let Err(e) = writer.append(clip) {
            writer.abandon();
            return Err(e);
        }
    }
    writer.publish()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::HighlightWindow;
    use tempfile::tempdir;
    use zip::ZipArchive;

    pub(crate) fn entry_names(path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        archive.file_names().map(String::from).collect::<Vec<_>>()
    }

    fn write_clip(dir: &Path, index: usize) -> Clip {
        let clip = Clip {
            index,
            window: HighlightWindow {
                start: 0.0,
                end: 12.0,
            },
            path: dir.join(format!("highlight_{}.mp4", index)),
        };
        std::fs::write(&clip.path, format!("clip {}", index)).unwrap();
        clip
    }

    #[test]
    fn test_package_publishes_all_clips() {
        let dir = tempdir().unwrap();
        let clips = vec![write_clip(dir.path(), 0), write_clip(dir.path(), 1)];
        let archive_path = dir.path().join("highlights.zip");

        let result = package(&clips, &archive_path).unwrap();

        assert_eq!(result.clip_count, 2);
        assert_eq!(result.archive_path, archive_path);
        let mut names = entry_names(&archive_path);
        names.sort();
        assert_eq!(names, vec!["highlight_0.mp4", "highlight_1.mp4"]);
        assert!(!partial_path(&archive_path).exists());
    }

    #[test]
    fn test_empty_archive_has_no_entries() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("highlights.zip");

        let result = package(&[], &archive_path).unwrap();

        assert_eq!(result.clip_count, 0);
        assert!(entry_names(&archive_path).is_empty());
    }

    #[test]
    fn test_entry_content_is_clip_file() {
        let dir = tempdir().unwrap();
        let clips = vec![write_clip(dir.path(), 0)];
        let archive_path = dir.path().join("highlights.zip");
        package(&clips, &archive_path).unwrap();

        let mut archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        let mut entry = archive.by_name("highlight_0.mp4").unwrap();
        let mut content = String::new();
        io::Read::read_to_string(&mut entry, &mut content).unwrap();
        assert_eq!(content, "clip 0");
    }

    #[test]
    fn test_missing_clip_leaves_only_partial_archive() {
        let dir = tempdir().unwrap();
        let mut clips = vec![write_clip(dir.path(), 0)];
        clips.push(Clip {
            index: 1,
            window: HighlightWindow {
                start: 30.0,
                end: 45.0,
            },
            path: dir.path().join("missing.mp4"),
        });
        let archive_path = dir.path().join("highlights.zip");

        let result = package(&clips, &archive_path);

        assert!(matches!(result, Err(HighlightError::Encoding(_))));
        assert!(!archive_path.exists());
        assert_eq!(entry_names(&partial_path(&archive_path)), vec!["highlight_0.mp4"]);
    }

    #[test]
    fn test_partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/out/job/highlights.zip")),
            PathBuf::from("/out/job/highlights.zip.partial")
        );
    }
}
