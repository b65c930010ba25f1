//! Services the surrounding host framework provides to a miner instance.

use std::collections::HashMap;
use std::sync::Arc;

use crate::algorithm::AlgorithmType;
use crate::benchmark::BenchmarkPerformanceType;
use crate::device::MiningPair;
use crate::error::{MinerError, Result};
use crate::port::PortAllocator;

/// Resolves a mining location to a `host:port` pool address
pub trait PoolLocator: Send + Sync {
    fn location(&self, algorithm: AlgorithmType, location: &str) -> Result<String>;
}

/// Environment variables for the miner process
pub trait EnvironmentProvider: Send + Sync {
    fn environment(&self) -> Vec<(String, String)>;
}

/// Picks the benchmark length in seconds
pub trait BenchmarkTimeResolver: Send + Sync {
    fn benchmark_time(
        &self,
        defaults: [u64; 3],
        pairs: &[MiningPair],
        performance: BenchmarkPerformanceType,
    ) -> u64;
}

/// Pool addresses keyed by (algorithm, location), with an optional catch-all
#[derive(Debug, Clone, Default)]
pub struct StaticPoolLocator {
    pools: HashMap<(AlgorithmType, String), String>,
    fallback: Option<String>,
}

impl StaticPoolLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool(
        mut self,
        algorithm: AlgorithmType,
        location: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        self.pools.insert((algorithm, location.into()), address.into());
        self
    }

    pub fn with_fallback(mut self, address: impl Into<String>) -> Self {
        self.fallback = Some(address.into());
        self
    }
}

impl PoolLocator for StaticPoolLocator {
    fn location(&self, algorithm: AlgorithmType, location: &str) -> Result<String> {
        self.pools
            .get(&(algorithm, location.to_string()))
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| MinerError::UnknownPoolLocation {
                algorithm,
                location: location.to_string(),
            })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment(pub Vec<(String, String)>);

impl EnvironmentProvider for StaticEnvironment {
    fn environment(&self) -> Vec<(String, String)> {
        self.0.clone()
    }
}

/// Quick/Standard/Precise map onto the three default slots
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBenchmarkTimes;

impl BenchmarkTimeResolver for DefaultBenchmarkTimes {
    fn benchmark_time(
        &self,
        defaults: [u64; 3],
        _pairs: &[MiningPair],
        performance: BenchmarkPerformanceType,
    ) -> u64 {
        match performance {
            BenchmarkPerformanceType::Quick => defaults[0],
            BenchmarkPerformanceType::Standard => defaults[1],
            BenchmarkPerformanceType::Precise => defaults[2],
        }
    }
}

/// Everything a miner instance borrows from the host
#[derive(Clone)]
pub struct HostServices {
    pub pools: Arc<dyn PoolLocator>,
    pub environment: Arc<dyn EnvironmentProvider>,
    pub benchmark_times: Arc<dyn BenchmarkTimeResolver>,
    /// `None` scans the port range from `MinerSettings`
    pub ports: Option<Arc<dyn PortAllocator>>,
}

impl HostServices {
    pub fn new(pools: impl PoolLocator + 'static) -> Self {
        Self {
            pools: Arc::new(pools),
            environment: Arc::new(StaticEnvironment::default()),
            benchmark_times: Arc::new(DefaultBenchmarkTimes),
            ports: None,
        }
    }

    pub fn with_environment(mut self, environment: impl EnvironmentProvider + 'static) -> Self {
        self.environment = Arc::new(environment);
        self
    }

    pub fn with_benchmark_times(mut self, resolver: impl BenchmarkTimeResolver + 'static) -> Self {
        self.benchmark_times = Arc::new(resolver);
        self
    }

    pub fn with_ports(mut self, ports: impl PortAllocator + 'static) -> Self {
        self.ports = Some(Arc::new(ports));
        self
    }
}
