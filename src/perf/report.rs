use chrono::{DateTime, Utc};
use serde::Serialize;

use super::stats::FrameTimeStats;

/// Qualitative verdict on render-loop health
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Rating {
    Poor,
    Sluggish,
    Acceptable,
    Good,
    Excellent,
}

impl Rating {
    /// Tiered on (average FPS, jank %), first matching tier wins
    pub fn from_metrics(avg_fps: f64, jank_rate: f64) -> Self {
        if avg_fps >= 55.0 && jank_rate < 5.0 {
            Rating::Excellent
        } else if avg_fps >= 45.0 && jank_rate < 10.0 {
            Rating::Good
        } else if avg_fps >= 30.0 && jank_rate < 20.0 {
            Rating::Acceptable
        } else if avg_fps >= 20.0 {
            Rating::Sluggish
        } else {
            Rating::Poor
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Rating::Excellent => "Excellent - smooth, no perceptible jank",
            Rating::Good => "Good - occasional dropped frames",
            Rating::Acceptable => "Acceptable - noticeable stutter",
            Rating::Sluggish => "Sluggish - frequent jank",
            Rating::Poor => "Poor - render loop is struggling",
        }
    }
}

/// Result of one measurement run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerfReport {
    pub generated_at: DateTime<Utc>,
    /// Host time between start and end of the run
    pub duration_ms: f64,
    pub frame_count: usize,
    pub avg_fps: f64,
    pub frame_time: FrameTimeStats,
    pub jank_count: u64,
    /// Percent of frames over budget
    pub jank_rate: f64,
    /// Probe samples where the overlay patch changed
    pub canvas_draws: u64,
    pub canvas_samples: u64,
    pub rating: Rating,
}

impl PerfReport {
    /// Derive the report; empty inputs give zeros, never NaN
    pub fn compute(
        frame_times_ms: &[f64],
        jank_count: u64,
        duration_ms: f64,
        canvas_draws: u64,
        canvas_samples: u64,
    ) -> Self {
        let frame_count = frame_times_ms.len();
        let elapsed_s = duration_ms / 1000.0;

        let avg_fps = if elapsed_s > 0.0 {
            frame_count as f64 / elapsed_s
        } else {
            0.0
        };
        let jank_rate = if frame_count > 0 {
            jank_count as f64 / frame_count as f64 * 100.0
        } else {
            0.0
        };

        Self {
            generated_at: Utc::now(),
            duration_ms,
            frame_count,
            avg_fps,
            frame_time: FrameTimeStats::from_samples(frame_times_ms),
            jank_count,
            jank_rate,
            canvas_draws,
            canvas_samples,
            rating: Rating::from_metrics(avg_fps, jank_rate),
        }
    }

    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════╗");
        println!("║ {:52} ║", "Render Loop Performance");
        println!("╠══════════════════════════════════════════════════════╣");
        println!("║ {:30} {:>21.1} ║", "Duration (s)", self.duration_ms / 1000.0);
        println!("║ {:30} {:>21} ║", "Frames", self.frame_count);
        println!("║ {:30} {:>21.1} ║", "Average FPS", self.avg_fps);
        println!("║ {:30} {:>18.2} ms ║", "Frame time avg", self.frame_time.avg_ms);
        println!("║ {:30} {:>18.2} ms ║", "Frame time min", self.frame_time.min_ms);
        println!("║ {:30} {:>18.2} ms ║", "Frame time max", self.frame_time.max_ms);
        println!("║ {:30} {:>18.2} ms ║", "P50", self.frame_time.p50_ms);
        println!("║ {:30} {:>18.2} ms ║", "P95", self.frame_time.p95_ms);
        println!("║ {:30} {:>18.2} ms ║", "P99", self.frame_time.p99_ms);
        println!("║ {:30} {:>21} ║", "Janky frames", self.jank_count);
        println!("║ {:30} {:>20.1}% ║", "Jank rate", self.jank_rate);
        println!("║ {:30} {:>21} ║", "Canvas draws", self.canvas_draws);
        println!("╠══════════════════════════════════════════════════════╣");
        println!("║ {:52} ║", self.rating.description());
        println!("╚══════════════════════════════════════════════════════╝");
    }
}
