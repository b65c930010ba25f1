/// Benchmarking for the miniZ adapter
pub mod parser;
pub mod runner;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::algorithm::{AlgorithmSpeed, AlgorithmType};

pub use parser::{extract_hashrate, parse_benchmark_log, HashrateAverage, HASHRATE_MARKER};
pub use runner::BenchmarkRunner;

/// How long the host wants a benchmark to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkPerformanceType {
    Quick,
    #[default]
    Standard,
    Precise,
}

/// Benchmark lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BenchmarkState {
    Idle,
    Launching,
    Running,
    Completed,
    TimedOut,
    Cancelled,
    Parsed,
}

/// Why the benchmark process stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Launch never happened
    NotStarted,
    Completed,
    TimedOut,
    Cancelled,
}

impl Termination {
    pub fn state(&self) -> BenchmarkState {
        match self {
            Termination::NotStarted => BenchmarkState::Idle,
            Termination::Completed => BenchmarkState::Completed,
            Termination::TimedOut => BenchmarkState::TimedOut,
            Termination::Cancelled => BenchmarkState::Cancelled,
        }
    }
}

/// Result handed back to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub speeds: Vec<AlgorithmSpeed>,
    pub success: bool,
    pub error_message: Option<String>,
}

impl BenchmarkResult {
    pub fn measured(algorithm: AlgorithmType, speed: f64) -> Self {
        Self {
            speeds: vec![AlgorithmSpeed::new(algorithm, speed)],
            success: speed > 0.0,
            error_message: None,
        }
    }

    /// Zero-speed failure for a session that produced no usable samples
    pub fn fallback(algorithm: AlgorithmType, termination: Termination, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let message = match termination {
            Termination::NotStarted => reason,
            Termination::Completed => format!("miner exited: {}", reason),
            Termination::TimedOut => format!("benchmark timed out: {}", reason),
            Termination::Cancelled => format!("benchmark cancelled: {}", reason),
        };
        Self {
            speeds: vec![AlgorithmSpeed::new(algorithm, 0.0)],
            success: false,
            error_message: Some(message),
        }
    }

    pub fn speed(&self) -> f64 {
        self.speeds.first().map(|s| s.speed).unwrap_or(0.0)
    }
}

/// Everything needed for one benchmark run
#[derive(Debug, Clone)]
pub struct BenchmarkSession {
    pub algorithm: AlgorithmType,

    /// Requested measurement time
    pub duration: Duration,

    /// Hard stop, `duration` plus grace
    pub timeout: Duration,

    pub poll_interval: Duration,

    pub binary: PathBuf,
    pub working_dir: PathBuf,

    /// Where miniZ writes its log; relative names resolve against `working_dir`
    pub log_file_name: String,

    pub command_line: String,
    pub environment: Vec<(String, String)>,
}

impl BenchmarkSession {
    pub fn log_path(&self) -> PathBuf {
        self.working_dir.join(&self.log_file_name)
    }

    /// Expected number of log samples, one per ten seconds
    pub fn target_iterations(&self) -> u64 {
        (self.duration.as_secs() / 10).max(1)
    }
}

/// Outcome of a benchmark run with the bookkeeping behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub result: BenchmarkResult,
    pub termination: Termination,
    pub final_state: BenchmarkState,
    pub samples: usize,
    pub target_iterations: u64,
}
