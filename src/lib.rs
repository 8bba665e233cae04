//! # IMU Relay Library
//!
//! Relay orientation-sensor telemetry from battery-powered LoRa nodes to a base
//! station that re-exposes the latest reading to a nearby client.
//!
//! This library provides the addressed framing protocol shared by every node,
//! the incremental receive parser and dispatcher on the base station, and the
//! periodic transmitter and telemetry encoder on the sensor nodes.

pub mod config;
pub mod error;
pub mod node;
pub mod protocol;
pub mod sensor;
pub mod serial;
pub mod telemetry;
pub mod transport;
