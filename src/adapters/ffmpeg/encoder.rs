use crate::ports::ClipEncoder;
use std::error::Error;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::Command;

#[derive(Debug)]
pub struct TranscodeError(String);

impl fmt::Display for TranscodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for TranscodeError {}

/// Re-encodes clips by running the `ffmpeg` binary.
#[derive(Clone, Debug)]
pub struct FfmpegCliEncoder {
    pub program: String,
    pub video_codec: String,
    pub audio_codec: String,
}

impl Default for FfmpegCliEncoder {
    fn default() -> Self {
        Self {
            program: String::from("ffmpeg"),
            video_codec: String::from("libx264"),
            audio_codec: String::from("aac"),
        }
    }
}

impl FfmpegCliEncoder {
    pub fn new(video_codec: impl Into<String>, audio_codec: impl Into<String>) -> Self {
        Self {
            video_codec: video_codec.into(),
            audio_codec: audio_codec.into(),
            ..Self::default()
        }
    }

    pub fn transcode_args(
        &self,
        source: &Path,
        start: f64,
        end: f64,
        output: &Path,
    ) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-v".into(),
            "error".into(),
            "-ss".into(),
            format!("{:.3}", start).into(),
            "-i".into(),
            source.into(),
            "-t".into(),
            format!("{:.3}", end - start).into(),
            "-c:v".into(),
            self.video_codec.clone().into(),
            "-c:a".into(),
            self.audio_codec.clone().into(),
            output.into(),
        ]
    }
}

impl ClipEncoder for FfmpegCliEncoder {
    fn encode_segment(
        &self,
        source: &Path,
        start: f64,
        end: f64,
        output: &Path,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let result = Command::new(&self.program)
            .args(self.transcode_args(source, start, end, output))
            .output()
            .map_err(|e| TranscodeError(format!("Could not run {}: {}", self.program, e)))?;

        if !result.status.success() {
            return Err(Box::new(TranscodeError(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            ))));
        }
        if !output.exists() {
            return Err(Box::new(TranscodeError(format!(
                "ffmpeg produced no output at {:?}",
                output
            ))));
        }
        Ok(())
    }
}
