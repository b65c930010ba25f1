#![cfg(unix)]

use async_trait::async_trait;
use miniz_plugin::{
    AlgorithmType, BenchmarkPerformanceType, BenchmarkState, Device, DeviceType, HostServices,
    MinerSettings, MiningPair, MiniZ, Result, StaticEnvironment, StaticPoolLocator,
    TelemetryTransport, Termination,
};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const UUID: &str = "3b3d5a2e-miniz-test";
const LOG_NAME: &str = "NVIDIA0NVIDIA1_150,5_bench.txt";

/// Stand-in for miniZ: finds `--logfile`, records its pid, then behaves per
/// `FAKE_MINIZ_MODE`.
const FAKE_MINIZ: &str = r#"#!/bin/sh
log=""
while [ "$#" -gt 0 ]; do
    if [ "$1" = "--logfile" ]; then
        shift
        log="$1"
    fi
    shift
done
echo "$$" > miner.pid
case "$FAKE_MINIZ_MODE" in
    finish)
        echo "miniZ v2.0c4 starting" >> "$log"
        echo "[ 0d 0h 0m10s] 100.00 I/s 200.00 Sol/s" >> "$log"
        echo "[ 0d 0h 0m20s] 200.00 I/s 400.00 Sol/s" >> "$log"
        echo "[ 0d 0h 0m30s] 300.00 I/s 600.00 Sol/s" >> "$log"
        ;;
    hang)
        echo "[ 0d 0h 0m10s] 50.00 I/s" >> "$log"
        exec sleep 60
        ;;
    silent)
        echo "connecting to pool" >> "$log"
        ;;
    nolog)
        ;;
    mine)
        exec sleep 60
        ;;
esac
"#;

struct Fixture {
    _dir: tempfile::TempDir,
    bins: PathBuf,
    settings: MinerSettings,
}

impl Fixture {
    fn new(benchmark_secs: u64) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let bins = dir.path().join(UUID).join("bins");
        std::fs::create_dir_all(&bins).unwrap();

        let script = bins.join("miniZ");
        std::fs::write(&script, FAKE_MINIZ).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let settings = MinerSettings {
            plugins_root: dir.path().to_path_buf(),
            binary_name: "miniZ".to_string(),
            benchmark_times: [benchmark_secs; 3],
            benchmark_grace: Duration::from_secs(1),
            poll_interval: Duration::from_millis(100),
            kill_grace: Duration::from_secs(5),
            warmup_delay: Duration::from_millis(50),
            ..MinerSettings::default()
        };

        Self {
            _dir: dir,
            bins,
            settings,
        }
    }

    fn miner(&self, mode: &str) -> MiniZ {
        let pairs = vec![
            MiningPair::new(Device::new(0, "GPU-0", DeviceType::Nvidia), AlgorithmType::Beam),
            MiningPair::new(Device::new(1, "GPU-1", DeviceType::Nvidia), AlgorithmType::Beam),
        ];
        let host = HostServices::new(StaticPoolLocator::new().with_fallback("beam.example.com:3370"))
            .with_environment(StaticEnvironment(vec![(
                "FAKE_MINIZ_MODE".to_string(),
                mode.to_string(),
            )]));
        MiniZ::new(UUID, pairs, "eu", "wallet.rig", self.settings.clone(), host).unwrap()
    }

    fn log_path(&self) -> PathBuf {
        self.bins.join(LOG_NAME)
    }
}

fn process_alive(pid_file: &Path) -> bool {
    // killed before it got as far as writing its pid
    let Ok(pid) = std::fs::read_to_string(pid_file) else {
        return false;
    };
    std::process::Command::new("kill")
        .args(["-0", pid.trim()])
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[tokio::test]
async fn test_completed_benchmark_averages_log() {
    let fixture = Fixture::new(10);
    std::fs::write(fixture.log_path(), "[ 0d 0h 9m 0s] 999999.00 I/s\n").unwrap();

    let mut miner = fixture.miner("finish");
    let report = miner
        .start_benchmark(CancellationToken::new(), BenchmarkPerformanceType::Standard)
        .await;

    assert_eq!(report.termination, Termination::Completed);
    assert_eq!(report.final_state, BenchmarkState::Parsed);
    assert_eq!(report.samples, 3);
    assert_eq!(report.target_iterations, 1);
    assert!(report.result.success);
    assert!((report.result.speed() - 196.0).abs() < 1e-9);
    assert_eq!(report.result.speeds[0].algorithm, AlgorithmType::Beam);
}

#[tokio::test]
async fn test_log_without_samples_fails() {
    let fixture = Fixture::new(10);
    let mut miner = fixture.miner("silent");
    let report = miner
        .start_benchmark(CancellationToken::new(), BenchmarkPerformanceType::Quick)
        .await;

    assert_eq!(report.termination, Termination::Completed);
    assert_eq!(report.samples, 0);
    assert!(!report.result.success);
    assert_eq!(report.result.speed(), 0.0);
}

#[tokio::test]
async fn test_missing_log_fails() {
    let fixture = Fixture::new(10);
    let mut miner = fixture.miner("nolog");
    let report = miner
        .start_benchmark(CancellationToken::new(), BenchmarkPerformanceType::Quick)
        .await;

    assert_eq!(report.termination, Termination::Completed);
    assert_eq!(report.final_state, BenchmarkState::Completed);
    assert!(!report.result.success);
    assert!(report.result.error_message.unwrap().contains("not found"));
}

#[tokio::test]
async fn test_timeout_kills_miner_and_keeps_partial_result() {
    let fixture = Fixture::new(1);
    let mut miner = fixture.miner("hang");

    let started = Instant::now();
    let report = miner
        .start_benchmark(CancellationToken::new(), BenchmarkPerformanceType::Quick)
        .await;

    assert!(started.elapsed() < Duration::from_secs(15));
    assert_eq!(report.termination, Termination::TimedOut);
    assert_eq!(report.samples, 1);
    assert!(report.result.success);
    assert!((report.result.speed() - 49.0).abs() < 1e-9);
    assert!(!process_alive(&fixture.bins.join("miner.pid")));
}

#[tokio::test]
async fn test_cancel_kills_miner() {
    let fixture = Fixture::new(120);
    let mut miner = fixture.miner("hang");

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let report = miner
        .start_benchmark(cancel, BenchmarkPerformanceType::Precise)
        .await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(report.termination, Termination::Cancelled);
    assert_eq!(report.target_iterations, 12);
    assert!(!process_alive(&fixture.bins.join("miner.pid")));
}

/// Answers every getstat with one device and counts the calls
#[derive(Default)]
struct CountingTransport {
    calls: AtomicUsize,
}

#[async_trait]
impl TelemetryTransport for CountingTransport {
    async fn exchange(&self, _port: u16, _request: &[u8]) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(br#"{"error":null,"result":[{"cudaid":0,"speed_sps":10.0,"gpu_power_usage":100.0}]}"#.to_vec())
    }
}

#[tokio::test]
async fn test_restart_waits_out_warmup_again() {
    let fixture = Fixture::new(10);
    let transport = Arc::new(CountingTransport::default());
    let mut miner = fixture.miner("mine").with_telemetry_transport(transport.clone());

    let mut process = miner.start_mining().unwrap();
    assert!(miner.get_miner_stats().await.is_empty());
    assert!(!miner.get_miner_stats().await.is_empty());
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    miner.stop_mining(&mut process).await.unwrap();

    let mut process = miner.start_mining().unwrap();
    assert!(miner.get_miner_stats().await.is_empty());
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

    assert!(!miner.get_miner_stats().await.is_empty());
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    miner.stop_mining(&mut process).await.unwrap();
}
