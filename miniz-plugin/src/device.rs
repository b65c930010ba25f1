use serde::{Deserialize, Serialize};
use std::fmt;

use crate::algorithm::AlgorithmType;
use crate::error::{MinerError, Result};

/// Device family, as named in benchmark log files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceType {
    Cpu,
    Nvidia,
    Amd,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceType::Cpu => "CPU",
            DeviceType::Nvidia => "NVIDIA",
            DeviceType::Amd => "AMD",
        };
        f.write_str(name)
    }
}

/// A device known to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Index the host (and miniZ's `cudaid`) uses for this device
    pub id: u32,

    /// Stable identifier used as the key in per-device readings
    pub uuid: String,

    pub device_type: DeviceType,
}

impl Device {
    pub fn new(id: u32, uuid: impl Into<String>, device_type: DeviceType) -> Self {
        Self {
            id,
            uuid: uuid.into(),
            device_type,
        }
    }

    /// `<type><id>` token used in benchmark log names
    pub fn log_token(&self) -> String {
        format!("{}{}", self.device_type, self.id)
    }
}

/// Device/algorithm assignment handed over by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningPair {
    pub device: Device,
    pub algorithm: AlgorithmType,
}

impl MiningPair {
    pub fn new(device: Device, algorithm: AlgorithmType) -> Self {
        Self { device, algorithm }
    }
}

/// Comma-joined device ids for `--cuda-devices`
pub fn device_id_list(pairs: &[MiningPair]) -> String {
    pairs
        .iter()
        .map(|pair| pair.device.id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Concatenated device tokens, e.g. `NVIDIA0NVIDIA1`
pub fn device_log_tokens(pairs: &[MiningPair]) -> String {
    pairs.iter().map(|pair| pair.device.log_token()).collect()
}

/// The single algorithm shared by all pairs
pub fn common_algorithm(pairs: &[MiningPair]) -> Result<AlgorithmType> {
    let first = pairs.first().ok_or(MinerError::NoMiningPairs)?.algorithm;
    match pairs.iter().find(|pair| pair.algorithm != first) {
        Some(other) => Err(MinerError::MixedAlgorithms(first, other.algorithm)),
        None => Ok(first),
    }
}
