//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field has a default, so an empty file (or no file) gives
//! a base station at address `0x01` talking to `/dev/ttyACM0` at 9600 baud.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{RelayError, Result};
use crate::protocol::frame::{Address, BROADCAST};
use crate::telemetry::encoder::PayloadFormat;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub node: NodeConfig,

    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub transmitter: TransmitterConfig,

    #[serde(default)]
    pub receiver: ReceiverConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Node identity
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// This node's own address (never 0xFF)
    #[serde(default = "default_address")]
    pub address: Address,

    /// Recipient used by the transmitter (0xFF = base station)
    #[serde(default = "default_destination")]
    pub destination: Address,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Sensor-node transmit loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TransmitterConfig {
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,

    #[serde(default)]
    pub payload: PayloadFormat,
}

/// Base-node receive loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReceiverConfig {
    /// Discard a partial frame after this much silence (0 = never)
    #[serde(default = "default_frame_timeout_ms")]
    pub frame_timeout_ms: u64,

    /// How often the receive loop polls when no bytes arrive
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Telemetry recorder configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_address() -> Address { 0x01 }
fn default_destination() -> Address { BROADCAST }

fn default_serial_port() -> String { "/dev/ttyACM0".to_string() }
fn default_baud_rate() -> u32 { 9600 }
fn default_timeout_ms() -> u64 { 100 }

fn default_period_ms() -> u64 { 1000 }

fn default_frame_timeout_ms() -> u64 { 30 }
fn default_poll_interval_ms() -> u64 { 50 }

fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_format() -> String { "jsonl".to_string() }

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            destination: default_destination(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            payload: PayloadFormat::default(),
        }
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            frame_timeout_ms: default_frame_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            format: default_log_format(),
        }
    }
}

/// UART rates supported by common transparent LoRa modules
const SUPPORTED_BAUD_RATES: &[u32] = &[1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

fn invalid(msg: impl std::fmt::Display) -> RelayError {
    RelayError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use imu_relay::config::Config;
    ///
    /// let config = Config::load("config/base.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.node.address == BROADCAST {
            return Err(invalid("node address 0xFF is reserved for broadcast"));
        }

        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if !SUPPORTED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of: {:?}",
                SUPPORTED_BAUD_RATES
            )));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(invalid("timeout_ms must be between 1 and 10000"));
        }

        if self.transmitter.period_ms == 0 || self.transmitter.period_ms > 60000 {
            return Err(invalid("period_ms must be between 1 and 60000"));
        }

        if self.receiver.frame_timeout_ms > 60000 {
            return Err(invalid("frame_timeout_ms must be between 0 and 60000"));
        }

        // A partial frame must expire before the next burst can arrive
        if self.receiver.frame_timeout_ms != 0
            && self.receiver.frame_timeout_ms * 2 > self.transmitter.period_ms
        {
            return Err(invalid(
                "frame_timeout_ms must be at most half of transmitter period_ms",
            ));
        }

        if self.receiver.poll_interval_ms == 0 || self.receiver.poll_interval_ms > 10000 {
            return Err(invalid("poll_interval_ms must be between 1 and 10000"));
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.telemetry.format != "jsonl" {
            return Err(invalid("log format must be 'jsonl' (only supported format)"));
        }

        Ok(())
    }
}
