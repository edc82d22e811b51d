use crate::domain::Frame;
use crate::ports::{SeekableVideo, VideoOpener};
use ffmpeg_next as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling::{context::Context as Scaler, flag::Flags};
use ffmpeg::util::frame::Video as VideoFrame;
use std::error::Error;
use std::path::Path;

/// Opens videos with libavformat and decodes them to RGB24.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegOpener;

impl VideoOpener for FfmpegOpener {
    type Video = FfmpegVideo;

    fn open(&self, path: &Path) -> Result<FfmpegVideo, Box<dyn Error + Send + Sync>> {
        FfmpegVideo::open(path)
    }
}

pub struct FfmpegVideo {
    input: ffmpeg::format::context::Input,
    decoder: ffmpeg::decoder::Video,
    scaler: Scaler,
    stream_index: usize,
    time_base: f64,
    start_time: i64,
    frame_rate: f64,
    duration: f64,
    position: u64,
    draining: bool,
    finished: bool,
}

impl FfmpegVideo {
    pub fn open(path: &Path) -> Result<Self, Box<dyn Error + Send + Sync>> {
        ffmpeg::init()?;

        let input = ffmpeg::format::input(&path)?;
        let (stream_index, time_base, start_time, frame_rate, stream_duration, parameters) = {
            let stream = input
                .streams()
                .best(ffmpeg::media::Type::Video)
                .ok_or(ffmpeg::Error::StreamNotFound)?;

            let mut frame_rate = f64::from(stream.avg_frame_rate());
            if !frame_rate.is_finite() || frame_rate <= 0.0 {
                frame_rate = f64::from(stream.rate());
            }
            let start_time = if stream.start_time() == ffmpeg::ffi::AV_NOPTS_VALUE {
                0
            } else {
                stream.start_time()
            };

            (
                stream.index(),
                f64::from(stream.time_base()),
                start_time,
                frame_rate,
                stream.duration(),
                stream.parameters(),
            )
        };

        // Zero when neither the container nor the stream knows; the frame
        // source then measures the decoded frames instead.
        let duration = if input.duration() > 0 {
            input.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64
        } else {
            stream_duration.max(0) as f64 * time_base
        };

        let decoder = ffmpeg::codec::context::Context::from_parameters(parameters)?
            .decoder()
            .video()?;
        let scaler = Scaler::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            Flags::BILINEAR,
        )?;

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            time_base,
            start_time,
            frame_rate,
            duration,
            position: 0,
            draining: false,
            finished: false,
        })
    }

    /// Decode the next frame of the video stream in presentation order.
    fn decode_next(&mut self) -> Result<Option<VideoFrame>, ffmpeg::Error> {
        if self.finished {
            return Ok(None);
        }

        let mut decoded = VideoFrame::empty();
        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                self.position += 1;
                return Ok(Some(decoded));
            }
            if self.draining {
                self.finished = true;
                return Ok(None);
            }

            let mut packet = ffmpeg::Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index {
                        self.decoder.send_packet(&packet)?;
                    }
                }
                Err(ffmpeg::Error::Eof) => {
                    self.decoder.send_eof()?;
                    self.draining = true;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn timestamp_of(&self, frame: &VideoFrame, index: u64) -> f64 {
        match frame.timestamp().or(frame.pts()) {
            Some(ts) => (ts - self.start_time) as f64 * self.time_base,
            None => index as f64 / self.frame_rate,
        }
    }

    fn to_rgb(&mut self, frame: &VideoFrame) -> Result<Frame, ffmpeg::Error> {
        let mut rgb = VideoFrame::empty();
        self.scaler.run(frame, &mut rgb)?;

        let width = rgb.width();
        let height = rgb.height();
        let row = width as usize * 3;
        let stride = rgb.stride(0);
        let data = rgb.data(0);

        let mut pixels = Vec::with_capacity(row * height as usize);
        for y in 0..height as usize {
            let offset = y * stride;
            pixels.extend_from_slice(&data[offset..offset + row]);
        }

        Ok(Frame {
            width,
            height,
            pixels,
        })
    }
}

impl SeekableVideo for FfmpegVideo {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn read_frame(&mut self) -> Result<Option<(Frame, f64)>, Box<dyn Error + Send + Sync>> {
        let index = self.position;
        match self.decode_next()? {
            Some(decoded) => {
                let timestamp = self.timestamp_of(&decoded, index);
                let frame = self.to_rgb(&decoded)?;
                Ok(Some((frame, timestamp.max(0.0))))
            }
            None => Ok(None),
        }
    }

    /// Decodes and drops frames up to `frame_index`; the cursor never moves
    /// backwards.
    fn seek(&mut self, frame_index: u64) -> Result<(), Box<dyn Error + Send + Sync>> {
        while self.position < frame_index {
            if self.decode_next()?.is_none() {
                break;
            }
        }
        Ok(())
    }
}
