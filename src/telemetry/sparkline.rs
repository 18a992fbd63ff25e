use serde::Serialize;

const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// History series scaled against its running maximum
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sparkline {
    /// Normalized points in [0, 1], oldest first
    pub points: Vec<f64>,
    /// Maximum of the raw series the points were scaled by
    pub max: f64,
}

impl Sparkline {
    /// Normalize raw values; an all-zero (or empty) series stays flat at 0
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let raw: Vec<f64> = values
            .into_iter()
            .map(|v| if v.is_finite() { v.max(0.0) } else { 0.0 })
            .collect();
        let max = raw.iter().copied().fold(0.0, f64::max);

        let points = if max > 0.0 {
            raw.iter().map(|v| v / max).collect()
        } else {
            vec![0.0; raw.len()]
        };

        Self { points, max }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Unicode block rendering for terminals
    pub fn to_blocks(&self) -> String {
        self.points
            .iter()
            .map(|p| {
                let index = (p * (BLOCKS.len() - 1) as f64).round() as usize;
                BLOCKS[index.min(BLOCKS.len() - 1)]
            })
            .collect()
    }
}
