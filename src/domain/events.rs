use serde::{Deserialize, Serialize};

/// Decoded video frame, packed RGB24 rows without padding.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// One detector result for a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(alias = "class_name")]
    pub label: String,
    pub confidence: f32,
    /// `[x, y, width, height]` in pixels. Carried through but unused by the
    /// highlight logic.
    #[serde(default)]
    pub bbox: Option<[f32; 4]>,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox: None,
        }
    }
}

/// A detected class at a point in the video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionEvent {
    pub class_name: String,
    pub timestamp: f64,
}

impl DetectionEvent {
    pub fn new(class_name: impl Into<String>, timestamp: f64) -> Self {
        Self {
            class_name: class_name.into(),
            timestamp,
        }
    }
}
