use super::collector::collect_events;
use super::detection::{DetectionAdapter, DetectorFailure, DEFAULT_CONFIDENCE_THRESHOLD};
use super::extractor::ClipExtractor;
use super::frame_source::FrameSource;
use super::packager::ArchiveWriter;
use super::workspace::JobWorkspace;
use crate::domain::sampling::DEFAULT_SAMPLE_INTERVAL;
use crate::domain::{
    aggregate, AggregationParams, ArchiveResult, HighlightError, HighlightWindow, SamplingMode,
};
use crate::ports::{ClipEncoder, Detector, VideoOpener};
use std::path::Path;
use std::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub confidence_threshold: f32,
    pub sampling_mode: SamplingMode,
    pub sample_interval: f64,
    pub on_detector_failure: DetectorFailure,
    pub aggregation: AggregationParams,
    /// Keep a failed job's clips and partial archive on disk.
    pub keep_failed_jobs: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            sampling_mode: SamplingMode::Adaptive,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            on_detector_failure: DetectorFailure::Abort,
            aggregation: AggregationParams::default(),
            keep_failed_jobs: false,
        }
    }
}

/// Highlights found in a source video.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub windows: Vec<HighlightWindow>,
    pub source_duration: f64,
    pub event_count: usize,
}

/// Anything that can turn an intake video into a highlight archive.
pub trait JobRunner: Send + Sync {
    fn process(
        &self,
        source: &Path,
        workspace: &JobWorkspace,
    ) -> Result<ArchiveResult, HighlightError>;
}

/// Synchronous end-to-end pipeline: sample, detect, aggregate, extract,
/// package. The detector is shared by all jobs and used by one frame at a
/// time.
pub struct HighlightPipeline<O, D, E> {
    opener: O,
    detector: Mutex<D>,
    encoder: E,
    settings: PipelineSettings,
}

impl<O, D, E> HighlightPipeline<O, D, E>
where
    O: VideoOpener,
    D: Detector,
    E: ClipEncoder,
{
    pub fn new(opener: O, detector: D, encoder: E, settings: PipelineSettings) -> Self {
        Self {
            opener,
            detector: Mutex::new(detector),
            encoder,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Scan the source and compute its highlight windows.
    pub fn analyze(&self, source: &Path) -> Result<Analysis, HighlightError> {
        let video = self
            .opener
            .open(source)
            .map_err(|e| HighlightError::input(format!("Cannot open video file: {}", e)))?;
        let mut frames = FrameSource::new(
            video,
            self.settings.sampling_mode,
            self.settings.sample_interval,
        )?;
        let adapter = DetectionAdapter::new(
            &self.detector,
            self.settings.confidence_threshold,
            self.settings.on_detector_failure,
        );

        let events = collect_events(&mut frames, &adapter)?;
        let windows = aggregate(&events, self.settings.aggregation);
        info!(
            frames = frames.sampled(),
            events = events.len(),
            windows = windows.len(),
            "Scan complete"
        );

        Ok(Analysis {
            windows,
            source_duration: frames.duration(),
            event_count: events.len(),
        })
    }

    /// Extract every window and package the clips. Each clip goes into the
    /// archive as soon as it is written; the archive is published only when
    /// all windows succeeded.
    pub fn render(
        &self,
        source: &Path,
        analysis: &Analysis,
        workspace: &JobWorkspace,
    ) -> Result<ArchiveResult, HighlightError> {
        let extractor = ClipExtractor::new(
            &self.encoder,
            source,
            analysis.source_duration,
            &workspace.clips_dir,
        );
        let mut archive = ArchiveWriter::create(&workspace.archive_path)?;

        for (index, window) in analysis.windows.iter().enumerate() {
            let written = extractor
                .extract(index, window)
                .and_then(|clip| archive.append(&clip));
            if let Err(e) = written {
                let partial = archive.abandon();
                warn!(
                    "Job {} stopped at highlight {}, partial archive {:?}",
                    workspace.id, index, partial
                );
                return Err(e);
            }
        }

        archive.publish()
    }

    /// Run a job end to end inside its workspace. A failed job's workspace
    /// is discarded unless configured otherwise.
    pub fn run(
        &self,
        source: &Path,
        workspace: &JobWorkspace,
    ) -> Result<ArchiveResult, HighlightError> {
        info!("Job {} started for {:?}", workspace.id, source);

        let result = self
            .analyze(source)
            .and_then(|analysis| self.render(source, &analysis, workspace));

        match &result {
            Ok(archive) => info!("Job {}: {}", workspace.id, archive.message()),
            Err(e) => {
                error!("Job {} failed: {}", workspace.id, e);
                if !self.settings.keep_failed_jobs {
                    if let Err(cleanup) = workspace.discard() {
                        warn!("Could not clean up job {}: {}", workspace.id, cleanup);
                    }
                }
            }
        }
        result
    }
}

impl<O, D, E> JobRunner for HighlightPipeline<O, D, E>
where
    O: VideoOpener,
    D: Detector,
    E: ClipEncoder,
{
    fn process(
        &self,
        source: &Path,
        workspace: &JobWorkspace,
    ) -> Result<ArchiveResult, HighlightError> {
        self.run(source, workspace)
    }
}
