//! Adapters - Concrete implementations of ports.

pub mod detector;
pub mod ffmpeg;
pub mod http;
