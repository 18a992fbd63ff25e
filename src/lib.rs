pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod loaders;
pub mod math;
pub mod overlay;
pub mod perf;
pub mod telemetry;

pub use error::{Error, Result};
