use std::path::PathBuf;
use thiserror::Error;

use crate::algorithm::AlgorithmType;

/// miniZ adapter error types
#[derive(Error, Debug)]
pub enum MinerError {
    #[error("Algorithm {0} is not supported by miniZ")]
    UnsupportedAlgorithm(AlgorithmType),

    #[error("Mining pairs mix algorithms: {0} and {1}")]
    MixedAlgorithms(AlgorithmType, AlgorithmType),

    #[error("No mining pairs assigned")]
    NoMiningPairs,

    #[error("Invalid pool location '{0}', expected host:port")]
    InvalidPoolLocation(String),

    #[error("No pool location for {algorithm} in '{location}'")]
    UnknownPoolLocation {
        algorithm: AlgorithmType,
        location: String,
    },

    #[error("No free local port in {start}..={end}")]
    NoPortAvailable { start: u16, end: u16 },

    #[error("Telemetry error: {0}")]
    Telemetry(String),

    #[error("Telemetry timed out after {0:?}")]
    TelemetryTimeout(std::time::Duration),

    #[error("Benchmark log {0} not found")]
    LogFileMissing(PathBuf),

    #[error("Failed to launch {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MinerError>;
