use std::path::Path;
use std::time::Duration;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::parser::parse_benchmark_log;
use super::{BenchmarkReport, BenchmarkResult, BenchmarkSession, BenchmarkState, Termination};
use crate::process::MinerProcess;

/// Runs miniZ for a bounded time and reads the speed back from its log file.
///
/// miniZ's stdout is not parsed; with `--logfile` set the log is the only source of
/// samples.
#[derive(Debug, Clone)]
pub struct BenchmarkRunner {
    kill_grace: Duration,
    log_group: String,
}

impl BenchmarkRunner {
    pub fn new(kill_grace: Duration, log_group: impl Into<String>) -> Self {
        Self {
            kill_grace,
            log_group: log_group.into(),
        }
    }

    /// Run one session. Never fails: problems end up in the result's error message.
    pub async fn run(&self, session: &BenchmarkSession, cancel: CancellationToken) -> BenchmarkReport {
        let mut state = BenchmarkState::Idle;
        let log_path = session.log_path();
        let target_iterations = session.target_iterations();

        self.transition(&mut state, BenchmarkState::Launching);
        if let Err(e) = remove_stale_log(&log_path).await {
            error!("{}: Cannot remove old benchmark log {}: {}", self.log_group, log_path.display(), e);
            return self.report(
                BenchmarkResult::fallback(session.algorithm, Termination::NotStarted, e.to_string()),
                Termination::NotStarted,
                state,
                0,
                target_iterations,
            );
        }

        info!("{}: Benchmarking started with command: {}", self.log_group, session.command_line);
        let mut process = match MinerProcess::launch(
            &session.binary,
            &session.working_dir,
            &session.command_line,
            &session.environment,
        ) {
            Ok(process) => process,
            Err(e) => {
                error!("{}: Benchmarking failed: {}", self.log_group, e);
                return self.report(
                    BenchmarkResult::fallback(session.algorithm, Termination::NotStarted, e.to_string()),
                    Termination::NotStarted,
                    state,
                    0,
                    target_iterations,
                );
            }
        };

        self.transition(&mut state, BenchmarkState::Running);
        let termination = self.wait(&mut process, session, &cancel).await;
        if termination != Termination::Completed {
            if let Err(e) = process.kill(self.kill_grace).await {
                warn!("{}: Failed to stop benchmark process: {}", self.log_group, e);
            }
        }
        self.transition(&mut state, termination.state());

        match parse_benchmark_log(&log_path).await {
            Ok(average) => {
                self.transition(&mut state, BenchmarkState::Parsed);
                info!(
                    "{}: Benchmark {:?} with {}/{} samples, speed {:.4}",
                    self.log_group,
                    termination,
                    average.samples(),
                    target_iterations,
                    average.result()
                );

                let result = if average.samples() == 0 {
                    BenchmarkResult::fallback(session.algorithm, termination, "no hashrate samples in log")
                } else {
                    BenchmarkResult::measured(session.algorithm, average.result())
                };
                self.report(result, termination, state, average.samples(), target_iterations)
            }
            Err(e) => {
                error!("{}: Benchmarking failed: {}", self.log_group, e);
                self.report(
                    BenchmarkResult::fallback(session.algorithm, termination, e.to_string()),
                    termination,
                    state,
                    0,
                    target_iterations,
                )
            }
        }
    }

    /// Wait for exit, timeout or cancellation, whichever comes first
    async fn wait(
        &self,
        process: &mut MinerProcess,
        session: &BenchmarkSession,
        cancel: &CancellationToken,
    ) -> Termination {
        let started = Instant::now();
        let mut ticker = interval(session.poll_interval.max(Duration::from_millis(10)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let deadline = sleep(session.timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Termination::Cancelled,
                _ = &mut deadline => return Termination::TimedOut,
                status = process.wait() => {
                    match status {
                        Ok(status) => debug!("{}: miner exited with {}", self.log_group, status),
                        Err(e) => warn!("{}: waiting for miner failed: {}", self.log_group, e),
                    }
                    return Termination::Completed;
                }
                _ = ticker.tick() => {
                    trace!("{}: benchmark running for {:?}", self.log_group, started.elapsed());
                }
            }
        }
    }

    fn transition(&self, state: &mut BenchmarkState, next: BenchmarkState) {
        debug!("{}: benchmark {:?} -> {:?}", self.log_group, state, next);
        *state = next;
    }

    fn report(
        &self,
        result: BenchmarkResult,
        termination: Termination,
        final_state: BenchmarkState,
        samples: usize,
        target_iterations: u64,
    ) -> BenchmarkReport {
        BenchmarkReport {
            result,
            termination,
            final_state,
            samples,
            target_iterations,
        }
    }
}

/// Delete a leftover log from an earlier run; a missing file is fine
async fn remove_stale_log(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!("Removed stale benchmark log {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
