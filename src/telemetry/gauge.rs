use serde::{Deserialize, Serialize};

use crate::core::Rgba;

/// Severity band of a gauge value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GaugeLevel {
    Normal,
    Elevated,
    Critical,
}

impl GaugeLevel {
    pub fn color(&self) -> Rgba {
        match self {
            GaugeLevel::Normal => Rgba::new(76, 175, 80, 255),
            GaugeLevel::Elevated => Rgba::new(255, 152, 0, 255),
            GaugeLevel::Critical => Rgba::new(244, 67, 54, 255),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GaugeLevel::Normal => "normal",
            GaugeLevel::Elevated => "elevated",
            GaugeLevel::Critical => "critical",
        }
    }
}

/// Thresholds for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaugeSpec {
    /// Values strictly above this are elevated
    pub elevated_above: f64,
    /// Values strictly above this are critical
    pub critical_above: f64,
    /// Full-scale value for the fill fraction
    pub max: f64,
}

impl GaugeSpec {
    pub fn new(elevated_above: f64, critical_above: f64, max: f64) -> Self {
        Self {
            elevated_above,
            critical_above,
            max,
        }
    }

    /// Percentage metric on a 0-100 scale
    pub fn percent(elevated_above: f64, critical_above: f64) -> Self {
        Self::new(elevated_above, critical_above, 100.0)
    }

    pub fn classify(&self, value: f64) -> GaugeLevel {
        if value > self.critical_above {
            GaugeLevel::Critical
        } else if value > self.elevated_above {
            GaugeLevel::Elevated
        } else {
            GaugeLevel::Normal
        }
    }

    pub fn read(&self, value: f64) -> GaugeReading {
        let fraction = if self.max > 0.0 {
            (value / self.max).clamp(0.0, 1.0)
        } else {
            0.0
        };

        GaugeReading {
            value,
            level: self.classify(value),
            fraction,
        }
    }
}

/// Instantaneous gauge value ready for display
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaugeReading {
    pub value: f64,
    pub level: GaugeLevel,
    /// Fill in [0, 1]
    pub fraction: f64,
}
