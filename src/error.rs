//! Crate-wide error type.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the training pipeline
#[derive(Error, Debug)]
pub enum TrainError {
    /// Checkpoint directory or artifact could not be accessed
    #[error("storage error at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No prior run or checkpoint exists where one was requested
    #[error("not found: {0}")]
    NotFound(String),

    /// Resident memory crossed the abort threshold
    #[error("resource exhaustion: {used_gb:.1}/{total_gb:.1} GB RAM in use")]
    ResourceExhaustion { used_gb: f64, total_gb: f64 },

    /// A non-finite or otherwise unusable metric value was observed
    #[error("invalid metric in episode {episode}: {name} = {value}")]
    InvalidMetric {
        episode: usize,
        name: &'static str,
        value: f64,
    },

    /// Environment identifier missing from the registry
    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    /// Checkpoint, snapshot or config (de)serialization failed
    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

impl TrainError {
    /// Wrap an I/O error with the path it occurred on
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}
