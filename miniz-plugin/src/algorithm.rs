use serde::{Deserialize, Serialize};
use std::fmt;

/// miniZ developer fee, in percent of reported speed
pub const DEV_FEE_PERCENT: f64 = 2.0;

/// Multiplier applied to every speed miniZ reports
pub fn fee_factor() -> f64 {
    1.0 - DEV_FEE_PERCENT * 0.01
}

/// Algorithms known to the host framework.
///
/// Only the Equihash family has a miniZ parameter code; the rest exist so the
/// host can hand us any assignment and get a configuration error back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmType {
    ZHash,
    Beam,
    BeamV2,
    DaggerHashimoto,
    KawPow,
    GrinCuckatoo31,
    CuckooCycle,
    Octopus,
}

impl AlgorithmType {
    /// Equihash parameters passed to `--par`
    pub fn miniz_code(&self) -> Option<&'static str> {
        match self {
            AlgorithmType::ZHash => Some("144,5"),
            AlgorithmType::Beam => Some("150,5"),
            AlgorithmType::BeamV2 => Some("150,5,3"),
            _ => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.miniz_code().is_some()
    }
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Speed reported for one algorithm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmSpeed {
    pub algorithm: AlgorithmType,
    pub speed: f64,
}

impl AlgorithmSpeed {
    pub fn new(algorithm: AlgorithmType, speed: f64) -> Self {
        Self { algorithm, speed }
    }
}
