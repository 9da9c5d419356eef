//! Configuration management.

use anyhow::{bail, Context, Result};
use eink_panel_hw::device::{DEFAULT_BAUD_RATE, DEFAULT_PORT, DEFAULT_SETTLE};
use eink_panel_hw::protocol::{ACK_TIMEOUT, CHUNK_DELAY, CHUNK_SIZE};
use eink_panel_hw::LinkSettings;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Serial link configuration
    #[serde(default)]
    pub serial: SerialConfig,

    /// Protocol timing configuration
    #[serde(default)]
    pub protocol: ProtocolConfig,
}

/// Serial port configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SerialConfig {
    /// Serial port path
    #[serde(default = "default_port")]
    pub port: String,

    /// Baud rate
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Delay after opening the port in milliseconds
    #[serde(default = "default_settle")]
    pub settle_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            settle_ms: default_settle(),
        }
    }
}

/// Protocol timing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolConfig {
    /// ACK timeout in milliseconds
    #[serde(default = "default_ack_timeout")]
    pub ack_timeout_ms: u64,

    /// Payload chunk size in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Pause between payload chunks in milliseconds
    #[serde(default = "default_chunk_delay")]
    pub chunk_delay_ms: u64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: default_ack_timeout(),
            chunk_size: default_chunk_size(),
            chunk_delay_ms: default_chunk_delay(),
        }
    }
}

// Default value functions
fn default_port() -> String {
    DEFAULT_PORT.to_string()
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_settle() -> u64 {
    DEFAULT_SETTLE.as_millis() as u64
}

fn default_ack_timeout() -> u64 {
    ACK_TIMEOUT.as_millis() as u64
}

fn default_chunk_size() -> usize {
    CHUNK_SIZE
}

fn default_chunk_delay() -> u64 {
    CHUNK_DELAY.as_millis() as u64
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the link cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.serial.baud_rate == 0 {
            bail!("serial.baud_rate must be greater than 0");
        }
        if self.protocol.chunk_size == 0 {
            bail!("protocol.chunk_size must be greater than 0");
        }
        if self.protocol.ack_timeout_ms == 0 {
            bail!("protocol.ack_timeout_ms must be greater than 0");
        }
        Ok(())
    }

    /// Converts into driver link settings.
    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings {
            port: self.serial.port.clone(),
            baud_rate: self.serial.baud_rate,
            ack_timeout: Duration::from_millis(self.protocol.ack_timeout_ms),
            chunk_size: self.protocol.chunk_size,
            chunk_delay: Duration::from_millis(self.protocol.chunk_delay_ms),
            settle: Duration::from_millis(self.serial.settle_ms),
        }
    }
}
