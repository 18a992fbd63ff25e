use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::PathBuf;

use futures::future::{self, FutureExt, LocalBoxFuture};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Accelerator inference counters reported alongside usage
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceTracker {
    pub avg_inference_ms: f64,
    pub total_inferences: u64,
    pub last_device: Option<String>,
    /// Share of recent inferences served by the Coral TPU
    pub recent_coral_pct: f64,
}

/// One stats response from the telemetry service
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    #[serde(default)]
    pub gpu_percent: Option<f64>,
    #[serde(default)]
    pub inference: Option<InferenceTracker>,
}

/// Polled provider of stats snapshots
/// Fetches are async; the sampler drives them on the host's local pool
pub trait StatsSource {
    fn fetch(&self) -> LocalBoxFuture<'static, Result<StatsSnapshot>>;
}

/// CPU jiffies from the aggregate `cpu` line of /proc/stat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub busy: u64,
    pub total: u64,
}

/// Host usage read from procfs (Linux)
/// CPU percent is measured between consecutive fetches
#[derive(Debug)]
pub struct ProcStatsSource {
    root: PathBuf,
    previous: Cell<Option<CpuTimes>>,
}

impl ProcStatsSource {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            previous: Cell::new(None),
        }
    }

    fn read(&self) -> Result<StatsSnapshot> {
        let stat = std::fs::read_to_string(self.root.join("stat"))?;
        let meminfo = std::fs::read_to_string(self.root.join("meminfo"))?;

        let times = parse_cpu_times(&stat)?;
        let cpu_percent = cpu_percent(self.previous.replace(Some(times)), times);
        let memory_percent = parse_memory_percent(&meminfo)?;

        Ok(StatsSnapshot {
            cpu_percent,
            memory_percent,
            gpu_percent: None,
            inference: None,
        })
    }
}

impl Default for ProcStatsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSource for ProcStatsSource {
    fn fetch(&self) -> LocalBoxFuture<'static, Result<StatsSnapshot>> {
        future::ready(self.read()).boxed_local()
    }
}

/// Serves recorded snapshots in order, fails once they run out
#[derive(Debug, Default)]
pub struct ReplayStatsSource {
    snapshots: RefCell<VecDeque<StatsSnapshot>>,
}

impl ReplayStatsSource {
    pub fn new(snapshots: impl IntoIterator<Item = StatsSnapshot>) -> Self {
        Self {
            snapshots: RefCell::new(snapshots.into_iter().collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.snapshots.borrow().len()
    }
}

impl StatsSource for ReplayStatsSource {
    fn fetch(&self) -> LocalBoxFuture<'static, Result<StatsSnapshot>> {
        let next = self
            .snapshots
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::StatsFetch("replay exhausted".into()));
        future::ready(next).boxed_local()
    }
}

/// Parse the aggregate `cpu` line; idle includes iowait
pub fn parse_cpu_times(stat: &str) -> Result<CpuTimes> {
    let line = stat
        .lines()
        .find(|line| line.starts_with("cpu "))
        .ok_or_else(|| Error::StatsFetch("no aggregate cpu line in stat".into()))?;

    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|field| field.parse::<u64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| Error::StatsFetch(format!("bad cpu field: {}", e)))?;

    if fields.len() < 4 {
        return Err(Error::StatsFetch("truncated cpu line".into()));
    }

    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    // guest time is already folded into user/nice
    let total: u64 = fields.iter().take(8).sum();

    Ok(CpuTimes {
        busy: total.saturating_sub(idle),
        total,
    })
}

/// Busy share between two samples, or since boot without a previous one
pub fn cpu_percent(previous: Option<CpuTimes>, current: CpuTimes) -> f64 {
    let (busy, total) = match previous {
        Some(prev) => (
            current.busy.saturating_sub(prev.busy),
            current.total.saturating_sub(prev.total),
        ),
        None => (current.busy, current.total),
    };

    if total == 0 {
        0.0
    } else {
        busy as f64 / total as f64 * 100.0
    }
}

/// Used memory share from MemTotal and MemAvailable
pub fn parse_memory_percent(meminfo: &str) -> Result<f64> {
    let field = |name: &str| -> Option<u64> {
        meminfo
            .lines()
            .find(|line| line.starts_with(name))
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|value| value.parse().ok())
    };

    let total = field("MemTotal:").ok_or_else(|| Error::StatsFetch("MemTotal missing".into()))?;
    let available = field("MemAvailable:").ok_or_else(|| Error::StatsFetch("MemAvailable missing".into()))?;

    if total == 0 {
        return Ok(0.0);
    }
    Ok(total.saturating_sub(available) as f64 / total as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "cpu  100 0 100 700 100 0 0 0 0 0\ncpu0 50 0 50 350 50 0 0 0 0 0\n";

    #[test]
    fn test_parse_cpu_times() {
        let times = parse_cpu_times(STAT).unwrap();
        assert_eq!(times, CpuTimes { busy: 200, total: 1000 });
        assert_eq!(cpu_percent(None, times), 20.0);
    }

    #[test]
    fn test_cpu_percent_between_samples() {
        let before = CpuTimes { busy: 200, total: 1000 };
        let after = CpuTimes { busy: 275, total: 1100 };
        assert_eq!(cpu_percent(Some(before), after), 75.0);
        assert_eq!(cpu_percent(Some(after), after), 0.0);
    }

    #[test]
    fn test_parse_memory_percent() {
        let meminfo = "MemTotal:       1000 kB\nMemFree:   100 kB\nMemAvailable:    250 kB\n";
        assert_eq!(parse_memory_percent(meminfo).unwrap(), 75.0);
        assert!(parse_memory_percent("MemFree: 1 kB").is_err());
    }

    #[test]
    fn test_missing_cpu_line() {
        assert!(matches!(parse_cpu_times("intr 1 2 3"), Err(Error::StatsFetch(_))));
    }

    #[test]
    fn test_replay_source_runs_out() {
        let source = ReplayStatsSource::new(vec![StatsSnapshot {
            cpu_percent: 5.0,
            ..StatsSnapshot::default()
        }]);

        let first = futures::executor::block_on(source.fetch()).unwrap();
        assert_eq!(first.cpu_percent, 5.0);
        assert_eq!(source.remaining(), 0);
        assert!(futures::executor::block_on(source.fetch()).is_err());
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = r#"{
            "cpu_percent": 12.5,
            "memory_percent": 40,
            "inference": {"avg_inference_ms": 8.2, "total_inferences": 42, "last_device": "coral", "recent_coral_pct": 90}
        }"#;

        let snapshot: StatsSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.gpu_percent, None);
        assert_eq!(snapshot.inference.unwrap().last_device.as_deref(), Some("coral"));
    }
}
