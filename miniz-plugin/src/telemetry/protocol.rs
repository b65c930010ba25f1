use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// `getstat` request as miniZ expects it. The trailing `\n` is a literal
/// backslash followed by `n`, not a newline.
pub const GETSTAT_REQUEST: &[u8] = br#"{"id":"0", "method":"getstat"}\n"#;

/// `getstat` response
#[derive(Debug, Clone, Deserialize)]
pub struct GetStatResponse {
    #[serde(default)]
    pub error: Option<Value>,

    #[serde(default)]
    pub result: Option<Vec<DeviceStat>>,
}

/// One device record in a `getstat` response
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceStat {
    pub cudaid: i64,

    #[serde(default)]
    pub speed_sps: f64,

    #[serde(default)]
    pub gpu_power_usage: f64,
}

/// Live readings mapped onto host devices. `Default` is the empty snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MinerStats {
    pub speeds_total: Vec<crate::algorithm::AlgorithmSpeed>,
    pub power_usage_total: i32,

    /// Keyed by device uuid
    pub speeds_per_device: HashMap<String, Vec<crate::algorithm::AlgorithmSpeed>>,

    /// Keyed by device uuid, watts
    pub power_usage_per_device: HashMap<String, i32>,
}

impl MinerStats {
    pub fn is_empty(&self) -> bool {
        self.speeds_total.is_empty() && self.speeds_per_device.is_empty()
    }

    /// Fee-adjusted aggregate speed, zero when nothing was reported
    pub fn total_speed(&self) -> f64 {
        self.speeds_total.iter().map(|s| s.speed).sum()
    }
}
