use anyhow::{Context, Result};
use miniz_plugin::{
    AlgorithmType, Device, HostServices, MinerSettings, MiningPair, MiniZ,
    StaticEnvironment, StaticPoolLocator,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Harness configuration: what the host would normally hand the plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Plugin uuid, names the folder under `settings.plugins_root`
    pub uuid: String,
    pub algorithm: AlgorithmType,

    /// Key into `pools`
    pub location: String,
    pub username: String,
    pub devices: Vec<Device>,

    /// Location name to `host:port`
    pub pools: BTreeMap<String, String>,

    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    #[serde(default)]
    pub settings: MinerSettings,
}

impl HostConfig {
    /// Build the miner instance with host services backed by this file
    pub fn build_miner(&self) -> Result<MiniZ> {
        let pools = self
            .pools
            .iter()
            .fold(StaticPoolLocator::new(), |pools, (location, address)| {
                pools.with_pool(self.algorithm, location.clone(), address.clone())
            });
        let environment = StaticEnvironment(
            self.environment
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );
        let host = HostServices::new(pools).with_environment(environment);

        let pairs = self
            .devices
            .iter()
            .map(|device| MiningPair::new(device.clone(), self.algorithm))
            .collect();

        MiniZ::new(
            self.uuid.clone(),
            pairs,
            self.location.clone(),
            self.username.clone(),
            self.settings.clone(),
            host,
        )
        .context("Invalid miner configuration")
    }
}

/// Default config file location
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("miniz")
        .join("config.toml")
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<HostConfig> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "Configuration file not found at {}",
            path.display()
        ));
    }

    let contents = fs::read_to_string(path)?;
    let config: HostConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(config)
}
