use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::Dimensions;

/// Sampling interval assumed when a result does not carry one
pub const DEFAULT_FRAME_INTERVAL_S: f64 = 2.0;

/// Axis-aligned box in source-frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    /// Confidence in [0, 1], kept at wire precision for the caption
    pub score: f64,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

impl DetectedObject {
    /// Label text drawn next to the box, e.g. `person 91%`
    pub fn caption(&self) -> String {
        let percent = (self.score * 100.0 + 0.5).floor() as i64;
        format!("{} {}%", self.label, percent)
    }
}

/// Detections for one sampling instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    /// Seconds into the clip, aligned to the sampling interval
    pub time_s: f64,
    #[serde(default)]
    pub objects: Vec<DetectedObject>,
}

/// Analysis result for one clip as delivered by the analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(default)]
    pub detections: Vec<DetectionFrame>,
    #[serde(default = "default_frame_interval")]
    pub frame_interval: f64,
    #[serde(default)]
    pub frame_width: u32,
    #[serde(default)]
    pub frame_height: u32,
}

fn default_frame_interval() -> f64 {
    DEFAULT_FRAME_INTERVAL_S
}

impl DetectionResult {
    /// Coordinate space of the boxes, `None` when the service left it out
    pub fn frame_size(&self) -> Option<Dimensions> {
        let size = Dimensions::new(self.frame_width, self.frame_height);
        (!size.is_empty()).then_some(size)
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Immutable detection set for the clip currently loaded
#[derive(Debug, Clone)]
pub struct DetectionTrack {
    frames: Vec<DetectionFrame>,
    interval_s: f64,
    frame_size: Option<Dimensions>,
}

impl DetectionTrack {
    pub fn new(result: DetectionResult) -> Self {
        let frame_size = result.frame_size();
        let mut frames = result.detections;
        // Stable, so duplicates keep arrival order
        frames.sort_by(|a, b| a.time_s.total_cmp(&b.time_s));

        Self {
            frames,
            interval_s: result.frame_interval,
            frame_size,
        }
    }

    /// Frame for the bucket containing `current_time_s`
    pub fn select(&self, current_time_s: f64) -> Option<&DetectionFrame> {
        super::selector::select(current_time_s, self.interval_s, &self.frames)
    }

    pub fn frames(&self) -> &[DetectionFrame] {
        &self.frames
    }

    pub fn interval_s(&self) -> f64 {
        self.interval_s
    }

    pub fn frame_size(&self) -> Option<Dimensions> {
        self.frame_size
    }

    pub fn object_count(&self) -> usize {
        self.frames.iter().map(|frame| frame.objects.len()).sum()
    }
}
