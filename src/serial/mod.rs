//! # Serial Communication Module
//!
//! Handles the UART link to a transparent-mode LoRa radio module.
//!
//! This module handles:
//! - Opening the configured serial port (8N1) with fallback device paths
//! - Async write of encoded frames
//! - Async read of received bytes into the parser's buffer

pub mod port_trait;

use bytes::BytesMut;
use std::io;
use std::time::Duration;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::config::SerialConfig;
use crate::error::{RelayError, Result};
use port_trait::SerialPortIO;

/// Default radio module baud rate (UART side)
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Device paths tried when the configured port cannot be opened
const FALLBACK_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyACM0", // USB CDC bridges
    "/dev/ttyUSB0", // USB-to-serial adapters
    "/dev/serial0", // Raspberry Pi header UART
];

/// Serial link to the radio module
pub struct SerialLink {
    /// Serial port handle
    port: tokio_serial::SerialStream,
    /// Device path (e.g., /dev/ttyACM0)
    device_path: String,
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl SerialLink {
    /// Open the configured port, then fall back to the common device paths
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::SerialPortNotFound`] if no candidate opens. A node
    /// cannot run without its radio, so callers treat this as fatal.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use imu_relay::config::SerialConfig;
    /// use imu_relay::serial::SerialLink;
    ///
    /// fn main() -> anyhow::Result<()> {
    ///     let link = SerialLink::open(&SerialConfig::default())?;
    ///     println!("Radio on {}", link.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let mut paths: Vec<&str> = vec![config.port.as_str()];
        paths.extend(
            FALLBACK_DEVICE_PATHS
                .iter()
                .copied()
                .filter(|p| *p != config.port),
        );

        Self::open_with_paths(&paths, config.baud_rate, Duration::from_millis(config.timeout_ms))
    }

    /// Open the first device in `paths` that succeeds
    pub fn open_with_paths(paths: &[&str], baud_rate: u32, timeout: Duration) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate, timeout) {
                Ok(port) => {
                    info!("Opened radio module at {} ({} baud)", path, baud_rate);
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(RelayError::SerialPortNotFound(paths.join(", ")))
    }

    fn open_port(path: &str, baud_rate: u32, timeout: Duration) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .timeout(timeout)
            .open_native_async()
            .map_err(|e| RelayError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

#[async_trait::async_trait]
impl SerialPortIO for SerialLink {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.port.flush().await
    }

    async fn read_into(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        self.port.read_into(buf).await
    }
}

/// Write one encoded frame and flush
///
/// # Errors
///
/// Returns [`RelayError::Serial`] if the write or flush fails. Callers do not retry.
pub async fn send_frame<P: SerialPortIO + ?Sized>(port: &mut P, bytes: &[u8]) -> Result<()> {
    port.write_all(bytes)
        .await
        .map_err(|e| RelayError::Serial(format!("Failed to write frame: {}", e)))?;

    port.flush()
        .await
        .map_err(|e| RelayError::Serial(format!("Failed to flush serial port: {}", e)))?;

    debug!("Sent frame ({} bytes)", bytes.len());
    Ok(())
}
