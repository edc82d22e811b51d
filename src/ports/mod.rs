//! Ports - Traits at the external seams (decoder, detector, encoder).

pub mod detector;
pub mod encoder;
pub mod video;

pub use detector::Detector;
pub use encoder::ClipEncoder;
pub use video::{SeekableVideo, VideoOpener};
