//! Highlights - Video highlight generation service
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (sampling, events, highlight windows, clips)
//! - ports/: Trait definitions (video decoding, detection, clip encoding)
//! - adapters/: Concrete implementations (ffmpeg, detector process, HTTP)
//! - application/: The highlight job built on the ports
//! - config: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports for convenience
pub use application::{HighlightPipeline, JobRunner, PipelineSettings};
pub use config::ServiceConfig;
pub use domain::HighlightError;
