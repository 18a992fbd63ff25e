use thiserror::Error;

use crate::perf::HarnessState;

/// Errors surfaced by the overlay core
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stats fetch failed: {0}")]
    StatsFetch(String),

    #[error("pixel read refused: {0}")]
    PixelRead(String),

    #[error("harness cannot start from state {0:?}")]
    HarnessNotIdle(HarnessState),

    #[error("failed to spawn local task: {0}")]
    Spawn(#[from] futures::task::SpawnError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for overlay core operations
pub type Result<T> = std::result::Result<T, Error>;
