//! Domain layer - Pure highlight logic.

pub mod clips;
pub mod error;
pub mod events;
pub mod highlights;
pub mod sampling;

pub use clips::{ArchiveResult, Clip};
pub use error::HighlightError;
pub use events::{Detection, DetectionEvent, Frame};
pub use highlights::{aggregate, AggregationParams, HighlightAggregator, HighlightWindow};
pub use sampling::{SamplingMode, SamplingPolicy};
