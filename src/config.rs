use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::telemetry::GaugeSpec;

/// Top-level configuration, every section optional in the JSON file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: HostConfig,
    pub overlay: OverlayConfig,
    pub telemetry: TelemetryConfig,
    pub harness: HarnessConfig,
}

impl AppConfig {
    /// Load from a JSON file and validate
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.host.refresh_hz > 0.0) {
            return Err(Error::Config("host.refresh_hz must be positive".into()));
        }
        if !(self.overlay.time_update_hz > 0.0) {
            return Err(Error::Config("overlay.time_update_hz must be positive".into()));
        }
        if !(self.telemetry.poll_interval_ms > 0.0) {
            return Err(Error::Config("telemetry.poll_interval_ms must be positive".into()));
        }
        if self.telemetry.history_capacity == 0 {
            return Err(Error::Config("telemetry.history_capacity must be at least 1".into()));
        }
        if !(self.harness.window_ms > 0.0) || !(self.harness.probe_interval_ms > 0.0) {
            return Err(Error::Config("harness intervals must be positive".into()));
        }
        Ok(())
    }
}

/// Host event loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Display refresh rate frame callbacks are aligned to
    pub refresh_hz: f64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self { refresh_hz: 60.0 }
    }
}

/// Overlay drawing style and playback cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub enabled: bool,
    pub line_width: f32,
    /// Height of the label plate above each box
    pub label_height: f32,
    /// Approximate advance per label character, sizes the plate
    pub char_width: f32,
    pub label_padding: f32,
    pub text_color: [u8; 4],
    pub plate_alpha: u8,
    /// How often the simulated media element reports time updates
    pub time_update_hz: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            line_width: 2.0,
            label_height: 16.0,
            char_width: 7.0,
            label_padding: 3.0,
            text_color: [255, 255, 255, 255],
            plate_alpha: 200,
            time_update_hz: 4.0,
        }
    }
}

/// Stats polling and gauge thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub poll_interval_ms: f64,
    pub history_capacity: usize,
    pub cpu: GaugeSpec,
    pub memory: GaugeSpec,
    pub gpu: GaugeSpec,
    pub inference_ms: GaugeSpec,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5000.0,
            history_capacity: 60,
            cpu: GaugeSpec::percent(50.0, 80.0),
            memory: GaugeSpec::percent(70.0, 90.0),
            gpu: GaugeSpec::percent(50.0, 80.0),
            inference_ms: GaugeSpec::new(50.0, 100.0, 200.0),
        }
    }
}

/// Frame-scheduling instrumentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Measurement window before the report is produced
    pub window_ms: f64,
    /// Frames slower than this count as jank (60 Hz budget)
    pub jank_threshold_ms: f64,
    pub probe_interval_ms: f64,
    pub probe_region: ProbeRegion,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            window_ms: 10_000.0,
            jank_threshold_ms: 16.67,
            probe_interval_ms: 100.0,
            probe_region: ProbeRegion::default(),
        }
    }
}

/// Where a probe patch's `x`/`y` are measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeAnchor {
    TopLeft,
    /// Patch centred on the surface, `x`/`y` shift it right and down
    #[default]
    Center,
}

/// Pixel patch the canvas probe inspects
///
/// Centred by default: the top-left corner sits in the letterbox bars of
/// most layouts and never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeRegion {
    pub anchor: ProbeAnchor,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for ProbeRegion {
    fn default() -> Self {
        Self {
            anchor: ProbeAnchor::Center,
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        }
    }
}

impl ProbeRegion {
    pub fn top_left(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            anchor: ProbeAnchor::TopLeft,
            x,
            y,
            width,
            height,
        }
    }

    /// Top-left pixel of the patch on a `surface_width` x `surface_height` surface
    pub fn origin_in(&self, surface_width: u32, surface_height: u32) -> (u32, u32) {
        match self.anchor {
            ProbeAnchor::TopLeft => (self.x, self.y),
            ProbeAnchor::Center => (
                (surface_width.saturating_sub(self.width) / 2).saturating_add(self.x),
                (surface_height.saturating_sub(self.height) / 2).saturating_add(self.y),
            ),
        }
    }
}
