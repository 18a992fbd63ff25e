use anyhow::{Context, Result};
use log::info;
use std::path::Path;

use crate::overlay::DetectionResult;
use crate::telemetry::StatsSnapshot;

/// Loads an analysis result (detections per sampled frame) from JSON
pub fn load_detection_result(path: impl AsRef<Path>) -> Result<DetectionResult> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .context(format!("Failed to read detection file: {:?}", path))?;

    let result = DetectionResult::from_json(&text)
        .context(format!("Failed to parse detection file: {:?}", path))?;

    if !(result.frame_interval > 0.0) {
        anyhow::bail!(
            "Detection file {:?} has non-positive frame_interval {}",
            path,
            result.frame_interval
        );
    }

    info!(
        "Loaded {} detection frames ({}s interval) from {:?}",
        result.detections.len(),
        result.frame_interval,
        path
    );
    Ok(result)
}

/// Loads a recorded sequence of stats snapshots (a JSON array)
pub fn load_stats_recording(path: impl AsRef<Path>) -> Result<Vec<StatsSnapshot>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .context(format!("Failed to read stats recording: {:?}", path))?;

    let snapshots: Vec<StatsSnapshot> = serde_json::from_str(&text)
        .context(format!("Failed to parse stats recording: {:?}", path))?;

    info!("Loaded {} stats snapshots from {:?}", snapshots.len(), path);
    Ok(snapshots)
}
