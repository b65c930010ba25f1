use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::algorithm::AlgorithmType;
use crate::benchmark::{
    BenchmarkPerformanceType, BenchmarkReport, BenchmarkResult, BenchmarkRunner, BenchmarkSession,
    BenchmarkState, Termination,
};
use crate::command_line::{benchmark_log_name, CommandLineBuilder};
use crate::config::MinerSettings;
use crate::device::{common_algorithm, device_id_list, device_log_tokens, MiningPair};
use crate::error::{MinerError, Result};
use crate::host::HostServices;
use crate::port::{LocalPortAllocator, PortAllocator};
use crate::process::MinerProcess;
use crate::telemetry::{MinerStats, TcpTransport, TelemetryClient, TelemetryTransport};

/// One miniZ instance: a fixed set of mining pairs, one process, one telemetry port
pub struct MiniZ {
    uuid: String,
    pairs: Vec<MiningPair>,
    algorithm: AlgorithmType,
    devices: String,
    mining_location: String,
    username: String,
    settings: MinerSettings,
    host: HostServices,
    ports: Arc<dyn PortAllocator>,
    telemetry: TelemetryClient,
    api_port: Option<u16>,
    log_group: String,
}

impl MiniZ {
    /// Create an instance for `pairs`. Fails when the pairs do not share one
    /// algorithm miniZ can mine.
    pub fn new(
        uuid: impl Into<String>,
        pairs: Vec<MiningPair>,
        mining_location: impl Into<String>,
        username: impl Into<String>,
        settings: MinerSettings,
        host: HostServices,
    ) -> Result<Self> {
        let uuid = uuid.into();
        let algorithm = common_algorithm(&pairs)?;
        if !algorithm.is_supported() {
            return Err(MinerError::UnsupportedAlgorithm(algorithm));
        }

        let log_group = format!("MiniZ-{}", uuid.chars().take(8).collect::<String>());
        let transport = Arc::new(TcpTransport::new(settings.telemetry_timeout));
        let telemetry = TelemetryClient::new(transport, settings.warmup_delay, log_group.clone());
        let devices = device_id_list(&pairs);
        let ports: Arc<dyn PortAllocator> = match &host.ports {
            Some(ports) => ports.clone(),
            None => Arc::new(LocalPortAllocator::new(settings.port_range_start, settings.port_range_end)),
        };
        debug!("{}: {} on devices {}", log_group, algorithm, devices);

        Ok(Self {
            uuid,
            pairs,
            algorithm,
            devices,
            mining_location: mining_location.into(),
            username: username.into(),
            settings,
            host,
            ports,
            telemetry,
            api_port: None,
            log_group,
        })
    }

    /// Swap the telemetry transport, e.g. for a fake in tests
    pub fn with_telemetry_transport(mut self, transport: Arc<dyn TelemetryTransport>) -> Self {
        self.telemetry = TelemetryClient::new(transport, self.settings.warmup_delay, self.log_group.clone());
        self
    }

    pub fn algorithm(&self) -> AlgorithmType {
        self.algorithm
    }

    pub fn pairs(&self) -> &[MiningPair] {
        &self.pairs
    }

    /// Telemetry port of the most recent command line
    pub fn api_port(&self) -> Option<u16> {
        self.api_port
    }

    /// Executable path and its working directory
    pub fn bin_and_cwd_paths(&self) -> (PathBuf, PathBuf) {
        let bins = self.settings.plugins_root.join(&self.uuid).join("bins");
        (bins.join(&self.settings.binary_name), bins)
    }

    /// Command line for live mining; picks a fresh telemetry port
    pub fn mining_command_line(&mut self) -> Result<String> {
        let username = self.username.clone();
        self.create_command_line(&username, None)
    }

    fn create_command_line(&mut self, username: &str, log_file_name: Option<&str>) -> Result<String> {
        let port = self.ports.allocate()?;
        self.api_port = Some(port);

        let location = self.host.pools.location(self.algorithm, &self.mining_location)?;
        let builder = CommandLineBuilder {
            algorithm: self.algorithm,
            pool_location: &location,
            username,
            devices: &self.devices,
            telemetry_port: port,
            extra_parameters: &self.settings.extra_launch_parameters,
        };
        match log_file_name {
            Some(name) => builder.build_benchmark(name),
            None => builder.build(),
        }
    }

    /// Launch miniZ for mining. Supervision of the returned process is up to the caller.
    pub fn start_mining(&mut self) -> Result<MinerProcess> {
        let command_line = self.mining_command_line()?;
        let (binary, cwd) = self.bin_and_cwd_paths();
        info!("{}: Starting miner with command: {}", self.log_group, command_line);
        let process =
            MinerProcess::launch(&binary, &cwd, &command_line, &self.host.environment.environment())?;
        // new process, new listener
        self.telemetry.reset();
        Ok(process)
    }

    pub async fn stop_mining(&self, process: &mut MinerProcess) -> Result<()> {
        info!("{}: Stopping miner", self.log_group);
        process.kill(self.settings.kill_grace).await
    }

    /// Live speeds and power; empty while miniZ warms up or is unreachable
    pub async fn get_miner_stats(&mut self) -> MinerStats {
        let Some(port) = self.api_port else {
            warn!("{}: stats requested before the miner was started", self.log_group);
            return MinerStats::default();
        };
        self.telemetry.query_stats(port, self.algorithm, &self.pairs).await
    }

    /// Benchmark the assigned devices. Always returns a report; failures carry a
    /// zero speed and an error message.
    pub async fn start_benchmark(
        &mut self,
        cancel: CancellationToken,
        performance: BenchmarkPerformanceType,
    ) -> BenchmarkReport {
        let duration = self.benchmark_duration(performance);
        let session = match self.benchmark_session(duration) {
            Ok(session) => session,
            Err(e) => {
                error!("{}: Benchmarking failed: {}", self.log_group, e);
                return BenchmarkReport {
                    result: BenchmarkResult::fallback(self.algorithm, Termination::NotStarted, e.to_string()),
                    termination: Termination::NotStarted,
                    final_state: BenchmarkState::Idle,
                    samples: 0,
                    target_iterations: (duration.as_secs() / 10).max(1),
                };
            }
        };

        BenchmarkRunner::new(self.settings.kill_grace, self.log_group.clone())
            .run(&session, cancel)
            .await
    }

    fn benchmark_duration(&self, performance: BenchmarkPerformanceType) -> Duration {
        let seconds = self.host.benchmark_times.benchmark_time(
            self.settings.benchmark_times,
            &self.pairs,
            performance,
        );
        Duration::from_secs(seconds)
    }

    fn benchmark_session(&mut self, duration: Duration) -> Result<BenchmarkSession> {
        let log_file_name = benchmark_log_name(&device_log_tokens(&self.pairs), self.algorithm)?;
        let demo_user = self.settings.demo_user.clone();
        let command_line = self.create_command_line(&demo_user, Some(&log_file_name))?;

        let (binary, working_dir) = self.bin_and_cwd_paths();
        Ok(BenchmarkSession {
            algorithm: self.algorithm,
            duration,
            timeout: duration + self.settings.benchmark_grace,
            poll_interval: self.settings.poll_interval,
            binary,
            working_dir,
            log_file_name,
            command_line,
            environment: self.host.environment.environment(),
        })
    }
}
