use crate::domain::sampling::SamplingPolicy;
use crate::domain::{Frame, HighlightError, SamplingMode};
use crate::ports::SeekableVideo;
use tracing::debug;

/// A frame picked by the sampler.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    pub index: u64,
    pub frame: Frame,
    pub timestamp: f64,
}

/// Lazy, forward-only sampler over a video.
///
/// After each sample the caller reports whether the frame produced any
/// detections through [`FrameSource::advance`]; the sampling policy turns
/// that outcome into the next cursor position. Once exhausted the source
/// stays exhausted.
pub struct FrameSource<V: SeekableVideo> {
    video: V,
    policy: SamplingPolicy,
    frame_rate: f64,
    duration: f64,
    pending: Option<u64>,
    last_timestamp: f64,
    sampled: u64,
    exhausted: bool,
}

impl<V: SeekableVideo> FrameSource<V> {
    pub fn new(video: V, mode: SamplingMode, interval: f64) -> Result<Self, HighlightError> {
        let frame_rate = video.frame_rate();
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(HighlightError::input(format!(
                "Video reports an invalid frame rate ({})",
                frame_rate
            )));
        }

        let policy = SamplingPolicy::for_frame_rate(mode, frame_rate, interval);
        let duration = video.duration();
        debug!(frame_rate, duration, frame_skip = policy.frame_skip, "frame source ready");

        Ok(Self {
            video,
            policy,
            frame_rate,
            duration,
            pending: None,
            last_timestamp: 0.0,
            sampled: 0,
            exhausted: false,
        })
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Duration reported by the container. Videos that report none fall back
    /// to the span of frames decoded so far, which covers the whole video once
    /// the source is exhausted.
    pub fn duration(&self) -> f64 {
        if self.duration.is_finite() && self.duration > 0.0 {
            return self.duration;
        }
        (self.video.position() as f64 / self.frame_rate).max(self.last_timestamp)
    }

    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }

    /// Number of frames handed out so far.
    pub fn sampled(&self) -> u64 {
        self.sampled
    }

    /// Read the frame at the cursor.
    ///
    /// A previous sample whose outcome was never reported counts as a frame
    /// without detections. Fails with an input error when the very first read
    /// finds no frame at all.
    pub fn next_sample(&mut self) -> Result<Option<SampledFrame>, HighlightError> {
        if self.pending.is_some() {
            self.advance(false)?;
        }
        if self.exhausted {
            return Ok(None);
        }

        let index = self.video.position();
        let read = self.video.read_frame().map_err(|e| {
            HighlightError::input(format!("Failed to decode frame {}: {}", index, e))
        })?;

        match read {
            Some((frame, timestamp)) => {
                // Decoders may report a slightly earlier pts after a seek.
                let timestamp = timestamp.max(self.last_timestamp);
                self.last_timestamp = timestamp;
                self.pending = Some(index);
                self.sampled += 1;
                Ok(Some(SampledFrame {
                    index,
                    frame,
                    timestamp,
                }))
            }
            None => {
                self.exhausted = true;
                if self.sampled == 0 {
                    return Err(HighlightError::input("Video yields no frames"));
                }
                Ok(None)
            }
        }
    }

    /// Report the detection outcome of the last sample and move the cursor.
    pub fn advance(&mut self, detected: bool) -> Result<(), HighlightError> {
        let Some(current) = self.pending.take() else {
            return Ok(());
        };

        let next = self.policy.next_position(current, detected);
        if next > self.video.position() {
            self.video.seek(next).map_err(|e| {
                HighlightError::input(format!("Failed to seek to frame {}: {}", next, e))
            })?;
        }
        Ok(())
    }
}
