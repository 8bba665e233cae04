//! # Node Roles
//!
//! The two halves of the relay:
//! - **Sensor node**: [`transmitter::ChannelTransmitter`] samples, encodes and sends
//! - **Base node**: [`base::BaseStation`] parses, validates and forwards
//!
//! Both are tick-driven. The caller owns the schedule (an interval in `main`,
//! or direct calls in tests).

pub mod base;
pub mod dispatcher;
pub mod transmitter;

/// Per-frame link quality reported by the receiving radio
///
/// Attached at the receiver only, never part of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelQuality {
    /// Signal-to-noise ratio in dB
    pub snr: f32,
    /// Received signal strength in dBm
    pub rssi: i32,
    /// Frequency error in Hz
    pub freq_err: i64,
}

/// Radio collaborator that reports quality for the frame just received
pub trait QualitySource {
    fn channel_quality(&mut self) -> ChannelQuality;
}

/// Quality source that always reports the same values
///
/// Transparent serial radio modules do not expose per-packet SNR or frequency
/// error, so the base node reports a fixed value for them.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedQuality(pub ChannelQuality);

impl QualitySource for FixedQuality {
    fn channel_quality(&mut self) -> ChannelQuality {
        self.0
    }
}
