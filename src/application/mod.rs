//! Application layer - The highlight job, built on the ports.

pub mod collector;
pub mod detection;
pub mod extractor;
pub mod frame_source;
pub mod packager;
pub mod pipeline;
pub mod workspace;

pub use detection::{DetectionAdapter, DetectorFailure};
pub use frame_source::FrameSource;
pub use pipeline::{HighlightPipeline, JobRunner, PipelineSettings};
pub use workspace::{ActiveJob, JobWorkspace, WorkspaceRetention};
