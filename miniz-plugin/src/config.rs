use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Per-instance adapter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerSettings {
    /// Directory holding one folder per plugin uuid
    #[serde(default = "default_plugins_root")]
    pub plugins_root: PathBuf,

    /// Executable name inside `<plugins_root>/<uuid>/bins`
    #[serde(default = "default_binary_name")]
    pub binary_name: String,

    /// Appended verbatim to every command line
    #[serde(default)]
    pub extra_launch_parameters: String,

    /// Bound on one telemetry round trip
    #[serde(default = "default_telemetry_timeout")]
    pub telemetry_timeout: Duration,

    /// Delay before the first telemetry query
    #[serde(default = "default_warmup_delay")]
    pub warmup_delay: Duration,

    /// Added to the benchmark time to get the benchmark timeout
    #[serde(default = "default_benchmark_grace")]
    pub benchmark_grace: Duration,

    /// How often a running benchmark is checked
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Time allowed for a killed process to be reaped
    #[serde(default = "default_kill_grace")]
    pub kill_grace: Duration,

    /// Quick/standard/precise benchmark seconds
    #[serde(default = "default_benchmark_times")]
    pub benchmark_times: [u64; 3],

    /// First port tried for the telemetry listener
    #[serde(default = "default_port_range_start")]
    pub port_range_start: u16,

    /// Last port tried for the telemetry listener
    #[serde(default = "default_port_range_end")]
    pub port_range_end: u16,

    /// Username used when benchmarking
    #[serde(default = "default_demo_user")]
    pub demo_user: String,
}

impl Default for MinerSettings {
    fn default() -> Self {
        Self {
            plugins_root: default_plugins_root(),
            binary_name: default_binary_name(),
            extra_launch_parameters: String::new(),
            telemetry_timeout: default_telemetry_timeout(),
            warmup_delay: default_warmup_delay(),
            benchmark_grace: default_benchmark_grace(),
            poll_interval: default_poll_interval(),
            kill_grace: default_kill_grace(),
            benchmark_times: default_benchmark_times(),
            port_range_start: default_port_range_start(),
            port_range_end: default_port_range_end(),
            demo_user: default_demo_user(),
        }
    }
}

// Default value functions for serde
fn default_plugins_root() -> PathBuf { PathBuf::from("miner_plugins") }
fn default_binary_name() -> String {
    if cfg!(windows) { "miniZ.exe".to_string() } else { "miniZ".to_string() }
}
fn default_telemetry_timeout() -> Duration { Duration::from_secs(5) }
fn default_warmup_delay() -> Duration { Duration::from_secs(3) }
fn default_benchmark_grace() -> Duration { Duration::from_secs(5) }
fn default_poll_interval() -> Duration { Duration::from_millis(1000) }
fn default_kill_grace() -> Duration { Duration::from_secs(5) }
fn default_benchmark_times() -> [u64; 3] { [30, 60, 120] }
fn default_port_range_start() -> u16 { 4000 }
fn default_port_range_end() -> u16 { 5000 }
fn default_demo_user() -> String {
    "33hGFJZQAfbdzyHGqhJPvZwncDjUBdZqjW.benchmark".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = MinerSettings::default();
        assert_eq!(settings.warmup_delay, Duration::from_secs(3));
        assert_eq!(settings.benchmark_grace, Duration::from_secs(5));
        assert_eq!(settings.benchmark_times, [30, 60, 120]);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: MinerSettings =
            serde_json::from_str(r#"{"binary_name":"miniZ-test","port_range_start":4100}"#).unwrap();
        assert_eq!(settings.binary_name, "miniZ-test");
        assert_eq!(settings.port_range_start, 4100);
        assert_eq!(settings.poll_interval, Duration::from_secs(1));
    }
}
