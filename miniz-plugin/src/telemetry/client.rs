use async_trait::async_trait;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::{sleep, timeout},
};
use tracing::{debug, error, info, trace};

use super::protocol::{GetStatResponse, MinerStats, GETSTAT_REQUEST};
use crate::algorithm::{fee_factor, AlgorithmSpeed, AlgorithmType};
use crate::device::MiningPair;
use crate::error::{MinerError, Result};

/// Largest telemetry response we are willing to buffer
pub const MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// One request/response exchange with the miner's telemetry listener
#[async_trait]
pub trait TelemetryTransport: Send + Sync {
    async fn exchange(&self, port: u16, request: &[u8]) -> Result<Vec<u8>>;
}

/// Loopback TCP transport; one connection per exchange
#[derive(Debug, Clone)]
pub struct TcpTransport {
    timeout: Duration,
}

impl TcpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl TelemetryTransport for TcpTransport {
    async fn exchange(&self, port: u16, request: &[u8]) -> Result<Vec<u8>> {
        let round_trip = async {
            let mut stream = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await?;
            stream.write_all(request).await?;

            let mut response = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = stream.read(&mut chunk).await?;
                if n == 0 {
                    break;
                }
                response.extend_from_slice(&chunk[..n]);

                // miniZ keeps the socket open, stop once a full document arrived
                if response.len() >= MAX_RESPONSE_BYTES
                    || serde_json::from_slice::<serde_json::Value>(&response).is_ok()
                {
                    break;
                }
            }
            Ok::<_, MinerError>(response)
        };

        timeout(self.timeout, round_trip)
            .await
            .map_err(|_| MinerError::TelemetryTimeout(self.timeout))?
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmupState {
    Cold,
    Warm,
}

/// Polls miniZ for live speeds and power.
///
/// The first call only waits out the warm-up delay, since miniZ opens its
/// telemetry listener some time after launch.
pub struct TelemetryClient {
    transport: Arc<dyn TelemetryTransport>,
    warmup_delay: Duration,
    state: WarmupState,
    log_group: String,
}

impl TelemetryClient {
    pub fn new(
        transport: Arc<dyn TelemetryTransport>,
        warmup_delay: Duration,
        log_group: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            warmup_delay,
            state: WarmupState::Cold,
            log_group: log_group.into(),
        }
    }

    pub fn state(&self) -> WarmupState {
        self.state
    }

    /// Re-arm the warm-up for a freshly launched process
    pub fn reset(&mut self) {
        self.state = WarmupState::Cold;
    }

    /// Current stats, or an empty snapshot when miniZ is not answering
    pub async fn query_stats(
        &mut self,
        port: u16,
        algorithm: AlgorithmType,
        pairs: &[MiningPair],
    ) -> MinerStats {
        if self.state == WarmupState::Cold {
            info!("{}: waiting {:?} for telemetry to come up", self.log_group, self.warmup_delay);
            sleep(self.warmup_delay).await;
            self.state = WarmupState::Warm;
            return MinerStats::default();
        }

        match self.fetch(port).await {
            Ok(response) => match stats_from_response(response, algorithm, pairs) {
                Ok(stats) => stats,
                Err(e) => {
                    error!("{}: Error occurred while getting API stats: {}", self.log_group, e);
                    MinerStats::default()
                }
            },
            Err(e) => {
                error!("{}: Error occurred while getting API stats: {}", self.log_group, e);
                MinerStats::default()
            }
        }
    }

    async fn fetch(&self, port: u16) -> Result<GetStatResponse> {
        let raw = self.transport.exchange(port, GETSTAT_REQUEST).await?;
        trace!("{}: getstat returned {} bytes", self.log_group, raw.len());
        Ok(serde_json::from_slice(&raw)?)
    }
}

/// Maps a `getstat` response onto the configured devices.
///
/// Devices without a matching `cudaid` are left out of the per-device maps.
pub fn stats_from_response(
    response: GetStatResponse,
    algorithm: AlgorithmType,
    pairs: &[MiningPair],
) -> Result<MinerStats> {
    if let Some(err) = response.error.filter(|e| !e.is_null()) {
        return Err(MinerError::Telemetry(format!("miner reported error: {}", err)));
    }
    let records = response
        .result
        .ok_or_else(|| MinerError::Telemetry("response has no result".to_string()))?;

    let fee = fee_factor();
    let mut speeds_per_device = HashMap::new();
    let mut power_usage_per_device = HashMap::new();
    let mut total_speed = 0.0;
    let mut total_power = 0;

    for pair in pairs {
        let device = &pair.device;
        let Some(stat) = records.iter().find(|r| r.cudaid == i64::from(device.id)) else {
            debug!("No telemetry record for device {}", device.id);
            continue;
        };

        let power = stat.gpu_power_usage as i32;
        total_speed += stat.speed_sps;
        total_power += power;
        speeds_per_device.insert(
            device.uuid.clone(),
            vec![AlgorithmSpeed::new(algorithm, stat.speed_sps * fee)],
        );
        power_usage_per_device.insert(device.uuid.clone(), power);
    }

    Ok(MinerStats {
        speeds_total: vec![AlgorithmSpeed::new(algorithm, total_speed * fee)],
        power_usage_total: total_power,
        speeds_per_device,
        power_usage_per_device,
    })
}
