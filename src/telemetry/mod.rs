//! Stats polling, bounded history, gauges and sparklines

mod gauge;
mod ring_buffer;
mod sampler;
pub mod source;
mod sparkline;

pub use gauge::{GaugeLevel, GaugeReading, GaugeSpec};
pub use ring_buffer::RingBuffer;
pub use sampler::{Metric, StatsSample, TelemetrySampler};
pub use source::{InferenceTracker, ProcStatsSource, ReplayStatsSource, StatsSnapshot, StatsSource};
pub use sparkline::Sparkline;
