use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use miniz_plugin::{MinerProcess, MinerStats, MiniZ};
use std::process::ExitStatus;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::ctrl_c_token;
use crate::config::HostConfig;

/// Start mining with the configured devices
#[derive(Args)]
pub struct MineArgs {
    /// Seconds between stats polls
    #[arg(short, long, default_value_t = 5)]
    interval: u64,

    /// Print the command line and exit
    #[arg(long)]
    dry_run: bool,
}

pub async fn execute(args: MineArgs, config: HostConfig) -> Result<()> {
    let mut miner = config.build_miner()?;

    if args.dry_run {
        let (binary, cwd) = miner.bin_and_cwd_paths();
        println!("{}", "✓ Configuration validated successfully".green());
        println!("  Binary: {}", binary.display());
        println!("  Working dir: {}", cwd.display());
        println!("  Command line: {}", miner.mining_command_line()?);
        return Ok(());
    }

    let mut process = miner.start_mining().context("Failed to start miniZ")?;
    let cancel = ctrl_c_token();
    let interval = Duration::from_secs(args.interval.max(1));

    match supervise(&mut miner, &mut process, &cancel, interval).await? {
        Exit::MinerExited(status) => {
            warn!("miniZ exited: {}", status);
            Ok(())
        }
        Exit::Interrupted => {
            miner.stop_mining(&mut process).await?;
            println!("{}", "Mining stopped".yellow());
            Ok(())
        }
    }
}

#[derive(Debug)]
enum Exit {
    Interrupted,
    MinerExited(ExitStatus),
}

/// Print stats every `interval` until Ctrl-C or the miner exits.
/// A slow stats query never delays either.
async fn supervise(
    miner: &mut MiniZ,
    process: &mut MinerProcess,
    cancel: &CancellationToken,
    interval: Duration,
) -> Result<Exit> {
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(Exit::Interrupted),
            status = process.wait() => return Ok(Exit::MinerExited(status?)),
            stats = async {
                ticker.tick().await;
                miner.get_miner_stats().await
            } => print_stats(&stats),
        }
    }
}

fn print_stats(stats: &MinerStats) {
    if stats.is_empty() {
        println!("{}", "waiting for telemetry...".bright_black());
        return;
    }

    println!(
        "{} {:.2} Sol/s  {} W",
        "Total".bold(),
        stats.total_speed(),
        stats.power_usage_total
    );

    let mut devices: Vec<_> = stats.speeds_per_device.iter().collect();
    devices.sort_by(|a, b| a.0.cmp(b.0));
    for (uuid, speeds) in devices {
        let speed: f64 = speeds.iter().map(|s| s.speed).sum();
        let power = stats.power_usage_per_device.get(uuid).copied().unwrap_or(0);
        println!("  {} {:.2} Sol/s  {} W", uuid.bright_cyan(), speed, power);
    }
}
