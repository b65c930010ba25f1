/// miniZ telemetry API
pub mod client;
pub mod protocol;

pub use client::{stats_from_response, TcpTransport, TelemetryClient, TelemetryTransport, WarmupState};
pub use protocol::{DeviceStat, GetStatResponse, MinerStats, GETSTAT_REQUEST};
