use serde::Serialize;

/// Descriptive statistics over a frame-time list (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FrameTimeStats {
    pub count: usize,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub std_dev_ms: f64,
}

impl FrameTimeStats {
    /// Compute from unsorted samples; every field is 0 for an empty list
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len();
        let avg = sorted.iter().sum::<f64>() / count as f64;

        let variance = sorted
            .iter()
            .map(|v| {
                let diff = v - avg;
                diff * diff
            })
            .sum::<f64>()
            / count as f64;

        Self {
            count,
            avg_ms: avg,
            min_ms: sorted[0],
            max_ms: sorted[count - 1],
            p50_ms: percentile(&sorted, 0.50),
            p95_ms: percentile(&sorted, 0.95),
            p99_ms: percentile(&sorted, 0.99),
            std_dev_ms: variance.sqrt(),
        }
    }
}

/// `sorted[floor(len * p)]`, clamped to the last element; 0 when empty
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = (sorted.len() as f64 * p.clamp(0.0, 1.0)).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}
