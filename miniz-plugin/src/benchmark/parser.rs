/// Hashrate extraction from miniZ log output
use std::path::Path;
use tracing::{debug, trace};

use crate::algorithm::fee_factor;
use crate::error::{MinerError, Result};

/// Unit miniZ prints after its iteration rate
pub const HASHRATE_MARKER: &str = "I/s";

/// Number immediately before the first `marker` in `line`.
///
/// Whitespace between the number and the marker is skipped. Returns `None` when the
/// marker is missing or the preceding token is not a plain decimal number.
pub fn extract_hashrate(line: &str, marker: &str) -> Option<f64> {
    if marker.is_empty() {
        return None;
    }
    let idx = line.find(marker)?;
    let before = line[..idx].trim_end();

    let start = before
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit() || *c == '.')
        .last()
        .map(|(i, _)| i)?;

    before[start..].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Running mean of log samples, fee-adjusted after every sample
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HashrateAverage {
    sum: f64,
    count: usize,
    result: f64,
}

impl HashrateAverage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sample: f64) {
        self.sum += sample;
        self.count += 1;
        self.result = (self.sum / self.count as f64) * fee_factor();
    }

    /// Feed one log line; lines without a sample are ignored
    pub fn add_line(&mut self, line: &str) -> bool {
        match extract_hashrate(line, HASHRATE_MARKER) {
            Some(sample) => {
                trace!("Sample {} from: {}", sample, line);
                self.add(sample);
                true
            }
            None => false,
        }
    }

    pub fn samples(&self) -> usize {
        self.count
    }

    /// Fee-adjusted mean, zero before any sample
    pub fn result(&self) -> f64 {
        self.result
    }

    pub fn success(&self) -> bool {
        self.result > 0.0
    }
}

/// Averages every sample in `text`
pub fn average_log_text(text: &str) -> HashrateAverage {
    let mut average = HashrateAverage::new();
    for line in text.lines() {
        average.add_line(line);
    }
    average
}

/// Reads and averages a benchmark log file. A missing file is an error.
pub async fn parse_benchmark_log(path: &Path) -> Result<HashrateAverage> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => MinerError::LogFileMissing(path.to_path_buf()),
        _ => MinerError::Io(e),
    })?;

    let average = average_log_text(&String::from_utf8_lossy(&bytes));
    debug!(
        "Parsed {} samples from {}, result {:.4}",
        average.samples(),
        path.display(),
        average.result()
    );
    Ok(average)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_hashrate() {
        assert_eq!(extract_hashrate("Speed: 1234.5 I/s", "I/s"), Some(1234.5));
        assert_eq!(extract_hashrate("no marker here", "I/s"), None);
        assert_eq!(extract_hashrate("garbageX I/s", "I/s"), None);
    }

    #[test]
    fn test_extract_hashrate_edges() {
        assert_eq!(extract_hashrate("[ 0d 0h 0m25s] 39.87I/s 79.73Sol/s", "I/s"), Some(39.87));
        assert_eq!(extract_hashrate("rate:42 I/s", "I/s"), Some(42.0));
        assert_eq!(extract_hashrate("1.2.3 I/s", "I/s"), None);
        assert_eq!(extract_hashrate(". I/s", "I/s"), None);
        assert_eq!(extract_hashrate("I/s at start", "I/s"), None);
        assert_eq!(extract_hashrate("12 I/s then 99 I/s", "I/s"), Some(12.0));
        assert_eq!(extract_hashrate("12 I/s", ""), None);
    }

    #[test]
    fn test_running_average_with_fee() {
        let average = average_log_text("a 100 I/s\nb 200 I/s\nc 300 I/s\n");
        assert_eq!(average.samples(), 3);
        assert!((average.result() - 196.0).abs() < 1e-9);
        assert!(average.success());
    }

    #[test]
    fn test_single_sample_is_enough() {
        let average = average_log_text("noise\n[ 0d 0h 1m 0s] 50 I/s\nmore noise");
        assert_eq!(average.samples(), 1);
        assert!((average.result() - 49.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_samples() {
        for text in ["", "starting miniZ\nconnected\n", "x I/s\n1.1.1 I/s\n"] {
            let average = average_log_text(text);
            assert_eq!(average.samples(), 0);
            assert_eq!(average.result(), 0.0);
            assert!(!average.success());
        }
    }

    #[test]
    fn test_zero_rate_is_not_success() {
        let average = average_log_text("0.00 I/s\n0 I/s\n");
        assert_eq!(average.samples(), 2);
        assert!(!average.success());
    }

    #[tokio::test]
    async fn test_missing_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("NVIDIA0_150,5_bench.txt");
        assert!(matches!(
            parse_benchmark_log(&path).await,
            Err(MinerError::LogFileMissing(p)) if p == path
        ));
    }

    #[tokio::test]
    async fn test_log_file_with_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.txt");
        std::fs::write(&path, b"\xff\xfe junk\n10 I/s\n30 I/s\n").unwrap();

        let average = parse_benchmark_log(&path).await.unwrap();
        assert_eq!(average.samples(), 2);
        assert!((average.result() - 19.6).abs() < 1e-9);
    }
}
