//! # Telemetry Module
//!
//! IMU reading types, the payload encoder carried inside radio frames, and the
//! base-station JSONL recorder.
//!
//! This module handles:
//! - The `TelemetryReading` record sampled once per transmit cycle
//! - Rendering readings as compact text documents (fixed 4-decimal floats)
//! - Writing accepted publications to rotating JSONL files

pub mod encoder;
pub mod reading;
pub mod recorder;
