//! miniZ argument string construction.
//!
//! The flag layout is the binary-compatibility surface with miniZ, so the output
//! is built with plain string formatting and kept stable byte for byte.

use crate::algorithm::AlgorithmType;
use crate::error::{MinerError, Result};

/// Suffix of every benchmark log file name
pub const BENCH_LOG_SUFFIX: &str = "_bench.txt";

/// Inputs for one miniZ invocation
#[derive(Debug, Clone)]
pub struct CommandLineBuilder<'a> {
    pub algorithm: AlgorithmType,

    /// Pool location as `host:port`
    pub pool_location: &'a str,

    pub username: &'a str,

    /// Comma-joined device ids
    pub devices: &'a str,

    pub telemetry_port: u16,

    /// Free-form parameters appended verbatim
    pub extra_parameters: &'a str,
}

impl<'a> CommandLineBuilder<'a> {
    /// Command line for live mining
    pub fn build(&self) -> Result<String> {
        let algo = self
            .algorithm
            .miniz_code()
            .ok_or(MinerError::UnsupportedAlgorithm(self.algorithm))?;
        let (host, port) = split_pool_location(self.pool_location)?;

        let mut cmd = format!(
            "--par={} --server={} --port={} --user={} --cuda-devices={} --telemetry={} {}",
            algo,
            host,
            port,
            self.username,
            self.devices,
            self.telemetry_port,
            self.extra_parameters
        );

        if self.algorithm == AlgorithmType::ZHash {
            cmd.push_str(" --pers=auto");
        }

        Ok(cmd)
    }

    /// Command line for a benchmark run writing to `log_file_name`
    pub fn build_benchmark(&self, log_file_name: &str) -> Result<String> {
        let mut cmd = self.build()?;
        cmd.push_str(" --nocolor --logfile ");
        cmd.push_str(log_file_name);
        Ok(cmd)
    }
}

/// Split `host:port` on the first colon
pub fn split_pool_location(location: &str) -> Result<(&str, &str)> {
    location
        .split_once(':')
        .ok_or_else(|| MinerError::InvalidPoolLocation(location.to_string()))
}

/// `<device tokens>_<algo code>_bench.txt`
pub fn benchmark_log_name(device_tokens: &str, algorithm: AlgorithmType) -> Result<String> {
    let algo = algorithm
        .miniz_code()
        .ok_or(MinerError::UnsupportedAlgorithm(algorithm))?;
    Ok(format!("{}_{}{}", device_tokens, algo, BENCH_LOG_SUFFIX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn builder(algorithm: AlgorithmType) -> CommandLineBuilder<'static> {
        CommandLineBuilder {
            algorithm,
            pool_location: "beamv2.eu.example.com:3378",
            username: "wallet.rig1",
            devices: "0,1",
            telemetry_port: 4001,
            extra_parameters: "--oc1",
        }
    }

    #[test]
    fn test_zhash_gets_personalization() {
        let cmd = builder(AlgorithmType::ZHash).build().unwrap();
        assert_eq!(
            cmd,
            "--par=144,5 --server=beamv2.eu.example.com --port=3378 --user=wallet.rig1 \
             --cuda-devices=0,1 --telemetry=4001 --oc1 --pers=auto"
        );
    }

    #[test]
    fn test_beam_variants() {
        let beam = builder(AlgorithmType::Beam).build().unwrap();
        assert_eq!(
            beam,
            "--par=150,5 --server=beamv2.eu.example.com --port=3378 --user=wallet.rig1 \
             --cuda-devices=0,1 --telemetry=4001 --oc1"
        );

        let beam_v2 = builder(AlgorithmType::BeamV2).build().unwrap();
        assert_eq!(
            beam_v2,
            "--par=150,5,3 --server=beamv2.eu.example.com --port=3378 --user=wallet.rig1 \
             --cuda-devices=0,1 --telemetry=4001 --oc1"
        );
    }

    #[test]
    fn test_empty_extra_parameters_keep_separator() {
        let mut b = builder(AlgorithmType::Beam);
        b.extra_parameters = "";
        assert!(b.build().unwrap().ends_with("--telemetry=4001 "));
    }

    #[test]
    fn test_unsupported_algorithm() {
        let err = builder(AlgorithmType::KawPow).build().unwrap_err();
        assert!(matches!(err, MinerError::UnsupportedAlgorithm(AlgorithmType::KawPow)));
    }

    #[test]
    fn test_pool_location_needs_colon() {
        let mut b = builder(AlgorithmType::Beam);
        b.pool_location = "pool.example.com";
        assert!(matches!(b.build(), Err(MinerError::InvalidPoolLocation(_))));

        assert_eq!(split_pool_location("a:1:2").unwrap(), ("a", "1:2"));
    }

    #[test]
    fn test_benchmark_command_line() {
        let name = benchmark_log_name("NVIDIA0NVIDIA1", AlgorithmType::ZHash).unwrap();
        assert_eq!(name, "NVIDIA0NVIDIA1_144,5_bench.txt");

        let cmd = builder(AlgorithmType::ZHash).build_benchmark(&name).unwrap();
        assert!(cmd.ends_with(
            "--oc1 --pers=auto --nocolor --logfile NVIDIA0NVIDIA1_144,5_bench.txt"
        ));
    }
}
