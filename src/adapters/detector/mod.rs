//! Object detector adapters.

pub mod process;

pub use process::ProcessDetector;
