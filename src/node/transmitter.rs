//! # Channel Transmitter
//!
//! One transmit cycle per [`ChannelTransmitter::tick`]: read the sensor, encode
//! the reading, frame it with this node's address and write it to the radio.
//! The caller provides the period (1 Hz by default).
//!
//! There are no retries. A cycle that fails for any reason is logged, counted
//! and skipped; the next tick starts from a fresh reading.

use tracing::{debug, error, warn};

use crate::config::NodeConfig;
use crate::error::{RelayError, Result};
use crate::protocol::frame::{Address, Frame};
use crate::sensor::SensorSource;
use crate::serial::port_trait::SerialPortIO;
use crate::serial::send_frame;
use crate::telemetry::encoder::{encode, PayloadFormat};

/// Transmitter counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TxStats {
    /// Frames written to the channel
    pub sent: u64,
    /// Payloads rejected by the frame builder
    pub oversized: u64,
    /// Cycles skipped because the sensor failed
    pub sensor_errors: u64,
    /// Channel writes that failed
    pub write_errors: u64,
}

/// Periodic sender owned by a sensor node
pub struct ChannelTransmitter<S, P> {
    address: Address,
    destination: Address,
    format: PayloadFormat,
    sensor: S,
    port: P,
    stats: TxStats,
}

impl<S: SensorSource, P: SerialPortIO> ChannelTransmitter<S, P> {
    pub fn new(node: &NodeConfig, format: PayloadFormat, sensor: S, port: P) -> Self {
        Self {
            address: node.address,
            destination: node.destination,
            format,
            sensor,
            port,
            stats: TxStats::default(),
        }
    }

    pub fn stats(&self) -> TxStats {
        self.stats
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// Build the frame for the next cycle without sending it
    ///
    /// # Errors
    ///
    /// - [`RelayError::Sensor`] if the sensor read fails
    /// - [`RelayError::PayloadTooLarge`] if the encoded reading exceeds 255 bytes
    pub fn next_frame(&mut self) -> Result<Frame> {
        let reading = self.sensor.read_reading()?;
        let payload = encode(&reading, self.format);
        Frame::new(self.address, self.destination, payload.into_bytes())
    }

    /// Run one full cycle, surfacing any failure to the caller
    pub async fn transmit_once(&mut self) -> Result<Frame> {
        let frame = self.next_frame()?;
        send_frame(&mut self.port, &frame.to_bytes()).await?;
        Ok(frame)
    }

    /// Run one cycle, logging and counting failures instead of returning them
    ///
    /// Returns `true` if a frame was written.
    pub async fn tick(&mut self) -> bool {
        match self.transmit_once().await {
            Ok(frame) => {
                self.stats.sent += 1;
                debug!(
                    "Sent 0x{:02X} -> 0x{:02X} ({} byte payload)",
                    frame.sender, frame.recipient, frame.length
                );
                true
            }
            Err(RelayError::PayloadTooLarge { len, max }) => {
                self.stats.oversized += 1;
                error!(
                    "Encoded reading is {} bytes, frame limit is {}; use the orientation payload format",
                    len, max
                );
                false
            }
            Err(RelayError::Sensor(msg)) => {
                self.stats.sensor_errors += 1;
                warn!("Sensor read failed, skipping cycle: {}", msg);
                false
            }
            Err(e) => {
                self.stats.write_errors += 1;
                debug!("Failed to send frame: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::{decode_frame, BROADCAST};
    use crate::sensor::MockSensorSource;
    use crate::serial::port_trait::mocks::MockSerialPort;
    use crate::telemetry::reading::{TelemetryReading, Vector3};
    use std::io;

    fn node() -> NodeConfig {
        NodeConfig {
            address: 0x02,
            destination: BROADCAST,
        }
    }

    fn reading(x: f32, y: f32, z: f32) -> TelemetryReading {
        TelemetryReading {
            orientation: Vector3::new(x, y, z),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_transmit_orientation_frame() {
        let mut sensor = MockSensorSource::new();
        sensor
            .expect_read_reading()
            .times(1)
            .returning(|| Ok(reading(1.0, 2.0, 3.0)));

        let port = MockSerialPort::new();
        let mut tx = ChannelTransmitter::new(&node(), PayloadFormat::Orientation, sensor, port.clone());

        assert!(tx.tick().await);

        let written = port.get_written_data();
        assert_eq!(written.len(), 1);

        let frame = decode_frame(&written[0]).unwrap();
        assert_eq!(frame.sender, 0x02);
        assert_eq!(frame.recipient, 0xFF);
        assert_eq!(frame.payload, br#"{"x":1.0000,"y":2.0000,"z":3.0000}"#.to_vec());
        assert_eq!(tx.stats().sent, 1);
    }

    #[tokio::test]
    async fn test_full_payload_is_rejected_not_truncated() {
        let mut sensor = MockSensorSource::new();
        sensor.expect_read_reading().returning(|| Ok(TelemetryReading::default()));

        let port = MockSerialPort::new();
        let mut tx = ChannelTransmitter::new(&node(), PayloadFormat::Full, sensor, port.clone());

        assert!(matches!(
            tx.transmit_once().await,
            Err(RelayError::PayloadTooLarge { max: 255, .. })
        ));
        assert!(!tx.tick().await);

        assert!(port.get_written_data().is_empty());
        assert_eq!(tx.stats().oversized, 1);
    }

    #[tokio::test]
    async fn test_sensor_failure_skips_cycle() {
        let mut sensor = MockSensorSource::new();
        sensor
            .expect_read_reading()
            .returning(|| Err(RelayError::Sensor("i2c timeout".to_string())));

        let port = MockSerialPort::new();
        let mut tx = ChannelTransmitter::new(&node(), PayloadFormat::Orientation, sensor, port.clone());

        assert!(!tx.tick().await);
        assert!(port.get_written_data().is_empty());
        assert_eq!(tx.stats().sensor_errors, 1);
    }

    #[tokio::test]
    async fn test_write_failure_is_not_retried() {
        let mut sensor = MockSensorSource::new();
        sensor
            .expect_read_reading()
            .times(2)
            .returning(|| Ok(reading(0.0, 0.0, 0.0)));

        let port = MockSerialPort::new();
        port.set_write_error(io::ErrorKind::BrokenPipe);
        let mut tx = ChannelTransmitter::new(&node(), PayloadFormat::Orientation, sensor, port.clone());

        assert!(!tx.tick().await);
        assert_eq!(tx.stats().write_errors, 1);
        assert!(port.get_written_data().is_empty());

        // Next cycle sends a fresh reading, the failed frame is not replayed
        port.clear_write_error();
        assert!(tx.tick().await);
        assert_eq!(port.get_written_data().len(), 1);
        assert_eq!(tx.stats().sent, 1);
    }

    #[tokio::test]
    async fn test_unicast_destination() {
        let mut sensor = MockSensorSource::new();
        sensor.expect_read_reading().returning(|| Ok(reading(0.0, 0.0, 0.0)));

        let port = MockSerialPort::new();
        let node = NodeConfig {
            address: 0x03,
            destination: 0x01,
        };
        let mut tx = ChannelTransmitter::new(&node, PayloadFormat::Orientation, sensor, port.clone());

        let frame = tx.transmit_once().await.unwrap();
        assert_eq!(frame.sender, 0x03);
        assert_eq!(frame.recipient, 0x01);
    }
}
