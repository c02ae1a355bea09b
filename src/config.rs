// src/config.rs
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;

use crate::drivers::history::DEFAULT_HISTORY_DEPTH;
use crate::drivers::ubertooth::{UBERTOOTH_PID, UBERTOOTH_VID};
use crate::drivers::DisplayRange;
use crate::types::ConnectionMode;

pub const CONFIG_ENV: &str = "SPECAN_CONFIG";
pub const SIMULATE_ENV: &str = "SPECAN_SIMULATE";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SpecanConfig {
    pub range: DisplayRange,
    pub history_depth: usize,
    // previous sweeps drawn as a fading trail
    pub persistence_depth: usize,
    pub mode: ConnectionMode,
    pub usb_vid: u16,
    pub usb_pid: u16,
    pub simulation_interval_ms: u64,
    pub stop_timeout_ms: u64,
}

impl Default for SpecanConfig {
    fn default() -> Self {
        Self {
            range: DisplayRange::default(),
            history_depth: DEFAULT_HISTORY_DEPTH,
            persistence_depth: 48,
            mode: ConnectionMode::Hardware,
            usb_vid: UBERTOOTH_VID,
            usb_pid: UBERTOOTH_PID,
            simulation_interval_ms: 20,
            stop_timeout_ms: 3000,
        }
    }
}

impl SpecanConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("malformed specan config")?;
        config.range.validate()?;
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Defaults, then the file named by `SPECAN_CONFIG`, then `SPECAN_SIMULATE`.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                let config = Self::load_file(Path::new(&path))?;
                info!("loaded config from {}", Path::new(&path).display());
                config
            }
            None => Self::default(),
        };
        if std::env::var(SIMULATE_ENV).map_or(false, |v| v == "1" || v == "true") {
            config.mode = ConnectionMode::Simulation;
        }
        Ok(config)
    }

    pub fn simulation_interval(&self) -> Duration {
        Duration::from_millis(self.simulation_interval_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}
