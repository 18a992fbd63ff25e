use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};
use serde::Serialize;

use super::gauge::{GaugeReading, GaugeSpec};
use super::ring_buffer::RingBuffer;
use super::source::{StatsSnapshot, StatsSource};
use super::sparkline::Sparkline;
use crate::config::TelemetryConfig;
use crate::core::{Host, TimerId};

/// One history point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSample {
    /// Host time the snapshot arrived
    pub timestamp_ms: f64,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub gpu_percent: Option<f64>,
    pub inference_ms: Option<f64>,
}

impl StatsSample {
    pub fn from_snapshot(timestamp_ms: f64, snapshot: &StatsSnapshot) -> Self {
        Self {
            timestamp_ms,
            cpu_percent: snapshot.cpu_percent,
            memory_percent: snapshot.memory_percent,
            gpu_percent: snapshot.gpu_percent,
            inference_ms: snapshot.inference.as_ref().map(|i| i.avg_inference_ms),
        }
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Cpu => Some(self.cpu_percent),
            Metric::Memory => Some(self.memory_percent),
            Metric::Gpu => self.gpu_percent,
            Metric::InferenceMs => self.inference_ms,
        }
    }
}

/// Metrics the sampler exposes as gauges and sparklines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Metric {
    Cpu,
    Memory,
    Gpu,
    InferenceMs,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Cpu, Metric::Memory, Metric::Gpu, Metric::InferenceMs];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Cpu => "cpu",
            Metric::Memory => "memory",
            Metric::Gpu => "gpu",
            Metric::InferenceMs => "inference",
        }
    }
}

struct SamplerState {
    config: TelemetryConfig,
    history: RingBuffer<StatsSample>,
    latest: Option<StatsSnapshot>,
    timer: Option<TimerId>,
    /// Bumped on stop so fetches started before it are discarded
    generation: u64,
    failures: u64,
}

impl SamplerState {
    fn spec(&self, metric: Metric) -> GaugeSpec {
        match metric {
            Metric::Cpu => self.config.cpu,
            Metric::Memory => self.config.memory,
            Metric::Gpu => self.config.gpu,
            Metric::InferenceMs => self.config.inference_ms,
        }
    }
}

/// Polls a stats source on a fixed cadence into a bounded history
///
/// Cloning yields another handle to the same sampler.
#[derive(Clone)]
pub struct TelemetrySampler {
    state: Rc<RefCell<SamplerState>>,
    source: Rc<dyn StatsSource>,
}

impl TelemetrySampler {
    pub fn new(source: Rc<dyn StatsSource>, config: TelemetryConfig) -> Self {
        let history = RingBuffer::new(config.history_capacity);
        Self {
            state: Rc::new(RefCell::new(SamplerState {
                config,
                history,
                latest: None,
                timer: None,
                generation: 0,
                failures: 0,
            })),
            source,
        }
    }

    /// Fetch now, then every poll interval
    /// Returns false (and does nothing) when already running
    pub fn start(&self, host: &mut Host) -> bool {
        if self.is_running() {
            return false;
        }

        let period = self.state.borrow().config.poll_interval_ms;
        let handle = self.clone();
        let timer = host.set_interval(period, Box::new(move |host| handle.poll(host)));
        self.state.borrow_mut().timer = Some(timer);

        info!("telemetry: polling every {}ms", period);
        self.poll(host);
        true
    }

    /// Cancel polling; in-flight fetches are dropped on arrival
    pub fn stop(&self, host: &mut Host) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(timer) = state.timer.take() else {
            return false;
        };

        host.clear_timer(timer);
        state.generation += 1;
        info!("telemetry: stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().timer.is_some()
    }

    /// Start one fetch on the host's local pool
    fn poll(&self, host: &mut Host) {
        let generation = self.state.borrow().generation;
        let fetch = self.source.fetch();
        let state = Rc::clone(&self.state);
        let clock = host.clock();

        let task = async move {
            let result = fetch.await;
            let mut state = state.borrow_mut();

            if state.timer.is_none() || state.generation != generation {
                debug!("telemetry: dropping sample fetched before stop");
                return;
            }

            match result {
                Ok(snapshot) => {
                    let sample = StatsSample::from_snapshot(clock.now_ms(), &snapshot);
                    debug!(
                        "telemetry: cpu {:.1}% mem {:.1}%",
                        sample.cpu_percent, sample.memory_percent
                    );
                    state.history.push(sample);
                    state.latest = Some(snapshot);
                }
                Err(e) => {
                    state.failures += 1;
                    warn!("telemetry: fetch failed, skipping sample: {}", e);
                }
            }
        };

        if let Err(e) = host.spawn_local(task) {
            warn!("telemetry: could not schedule fetch: {}", e);
        }
    }

    /// History oldest first
    pub fn history(&self) -> Vec<StatsSample> {
        self.state.borrow().history.to_vec()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.state.borrow().history.capacity()
    }

    pub fn failures(&self) -> u64 {
        self.state.borrow().failures
    }

    pub fn latest_snapshot(&self) -> Option<StatsSnapshot> {
        self.state.borrow().latest.clone()
    }

    /// Gauge for the newest sample, `None` when no value is known
    pub fn gauge(&self, metric: Metric) -> Option<GaugeReading> {
        let state = self.state.borrow();
        let value = state.history.latest()?.value(metric)?;
        Some(state.spec(metric).read(value))
    }

    /// All metrics that currently have a value
    pub fn gauges(&self) -> Vec<(Metric, GaugeReading)> {
        Metric::ALL
            .iter()
            .filter_map(|&metric| self.gauge(metric).map(|reading| (metric, reading)))
            .collect()
    }

    /// History of one metric scaled by its running maximum, gaps read as 0
    pub fn sparkline(&self, metric: Metric) -> Sparkline {
        let state = self.state.borrow();
        Sparkline::from_values(
            state
                .history
                .iter()
                .map(|sample| sample.value(metric).unwrap_or(0.0)),
        )
    }
}
