//! miniZ external miner adapter
//!
//! Drives the miniZ Equihash miner on behalf of a host that manages many miners
//! uniformly.
//!
//! # Features
//!
//! - Byte-stable miniZ command lines for ZHash, Beam and BeamV2
//! - Live per-device speed and power over miniZ's `getstat` telemetry API
//! - Time-boxed benchmarks with cancellation, measured from the miniZ log file
//! - Host services (pool lookup, ports, environment, benchmark times) behind traits
//!
//! # Example
//!
//! ```no_run
//! use miniz_plugin::{
//!     AlgorithmType, BenchmarkPerformanceType, Device, DeviceType, HostServices,
//!     MinerSettings, MiningPair, MiniZ, StaticPoolLocator,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pairs = vec![MiningPair::new(
//!         Device::new(0, "GPU-5e3e4b1c", DeviceType::Nvidia),
//!         AlgorithmType::BeamV2,
//!     )];
//!     let host = HostServices::new(
//!         StaticPoolLocator::new().with_fallback("beamv3.eu.example.com:3387"),
//!     );
//!     let mut miner = MiniZ::new("e294f620", pairs, "eu", "wallet.rig", MinerSettings::default(), host)?;
//!
//!     let report = miner
//!         .start_benchmark(CancellationToken::new(), BenchmarkPerformanceType::Quick)
//!         .await;
//!     println!("benchmark: {:?}", report.result);
//!     Ok(())
//! }
//! ```

pub mod algorithm;
pub mod benchmark;
pub mod command_line;
pub mod config;
pub mod device;
pub mod error;
pub mod host;
pub mod miner;
pub mod port;
pub mod process;
pub mod telemetry;

// Re-export main types
pub use algorithm::{AlgorithmSpeed, AlgorithmType, DEV_FEE_PERCENT};
pub use benchmark::{
    extract_hashrate, BenchmarkPerformanceType, BenchmarkReport, BenchmarkResult, BenchmarkRunner,
    BenchmarkSession, BenchmarkState, Termination,
};
pub use command_line::CommandLineBuilder;
pub use config::MinerSettings;
pub use device::{Device, DeviceType, MiningPair};
pub use error::{MinerError, Result};
pub use host::{
    BenchmarkTimeResolver, DefaultBenchmarkTimes, EnvironmentProvider, HostServices, PoolLocator,
    StaticEnvironment, StaticPoolLocator,
};
pub use miner::MiniZ;
pub use port::{LocalPortAllocator, PortAllocator};
pub use process::MinerProcess;
pub use telemetry::{MinerStats, TcpTransport, TelemetryClient, TelemetryTransport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
