use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use commands::*;

/// Standalone host for the miniZ adapter
#[derive(Parser)]
#[command(name = "miniz-host")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose mode (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file path
    #[arg(short, long, global = true, env = "MINIZ_HOST_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start miniZ and print live stats until Ctrl-C
    Mine(mine::MineArgs),

    /// Run one benchmark session
    Benchmark(benchmark::BenchmarkArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(cli.verbose > 1)
        .init();

    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let host_config = config::load_config(&config_path)?;

    match cli.command {
        Commands::Mine(args) => mine::execute(args, host_config).await?,
        Commands::Benchmark(args) => benchmark::execute(args, host_config).await?,
    }

    Ok(())
}
