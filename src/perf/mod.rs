mod console;
mod harness;
mod probe;
mod report;
pub mod stats;

pub use console::PerfConsole;
pub use harness::{HarnessState, PerfHarness, PerfMeasurement};
pub use probe::{CanvasProbe, PixelSource};
pub use report::{PerfReport, Rating};
pub use stats::{percentile, FrameTimeStats};
