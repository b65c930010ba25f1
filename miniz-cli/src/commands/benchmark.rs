use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::*;
use miniz_plugin::{BenchmarkPerformanceType, BenchmarkReport};
use tabled::{settings::Style, Table, Tabled};

use super::ctrl_c_token;
use crate::config::HostConfig;

/// Run a benchmark and print the measured speed
#[derive(Args)]
pub struct BenchmarkArgs {
    /// Benchmark length preset
    #[arg(short, long, value_enum, default_value_t = Performance::Standard)]
    performance: Performance,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Performance {
    Quick,
    Standard,
    Precise,
}

impl From<Performance> for BenchmarkPerformanceType {
    fn from(value: Performance) -> Self {
        match value {
            Performance::Quick => BenchmarkPerformanceType::Quick,
            Performance::Standard => BenchmarkPerformanceType::Standard,
            Performance::Precise => BenchmarkPerformanceType::Precise,
        }
    }
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Algorithm")]
    algorithm: String,
    #[tabled(rename = "Speed")]
    speed: String,
    #[tabled(rename = "Samples")]
    samples: String,
    #[tabled(rename = "Ended")]
    termination: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub async fn execute(args: BenchmarkArgs, config: HostConfig) -> Result<()> {
    let mut miner = config.build_miner()?;
    println!(
        "{} {} on {} device(s)",
        "Benchmarking".bold().cyan(),
        miner.algorithm().to_string().yellow(),
        miner.pairs().len()
    );

    let report = miner
        .start_benchmark(ctrl_c_token(), args.performance.into())
        .await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &BenchmarkReport) {
    let row = ReportRow {
        algorithm: report
            .result
            .speeds
            .first()
            .map(|s| s.algorithm.to_string())
            .unwrap_or_default(),
        speed: format!("{:.2} Sol/s", report.result.speed()),
        samples: format!("{}/{}", report.samples, report.target_iterations),
        termination: format!("{:?}", report.termination),
        status: if report.result.success {
            "ok".to_string()
        } else {
            "failed".to_string()
        },
    };

    let table = Table::new([row]).with(Style::rounded()).to_string();
    println!("{}", table);

    if let Some(message) = &report.result.error_message {
        println!("{}", message.red());
    }
}
