pub mod detections;

pub use detections::{load_detection_result, load_stats_recording};
