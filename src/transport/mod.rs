//! # Downstream Transport
//!
//! Hands accepted frames to whatever re-exposes them to clients.
//!
//! The dispatcher only needs [`Publisher`]. Concrete transports additionally
//! implement [`TransportEvents`] to follow the client connection lifecycle.

pub mod notify;

use serde::Serialize;

use crate::error::Result;
use crate::node::ChannelQuality;
use crate::protocol::frame::{Address, Frame};

/// One accepted message, flattened for the client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Publication {
    pub sender: Address,
    pub recipient: Address,
    pub message: String,

    #[serde(rename = "SNR")]
    pub snr: f32,

    #[serde(rename = "RSSI")]
    pub rssi: i32,

    #[serde(rename = "FreqErr")]
    pub freq_err: i64,
}

impl Publication {
    /// Build a publication, taking ownership of the frame payload
    ///
    /// Non-UTF-8 payload bytes are replaced with U+FFFD.
    pub fn from_frame(frame: Frame, quality: ChannelQuality) -> Self {
        let message = match String::from_utf8(frame.payload) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };

        Self {
            sender: frame.sender,
            recipient: frame.recipient,
            message,
            snr: quality.snr,
            rssi: quality.rssi,
            freq_err: quality.freq_err,
        }
    }

    /// Flat JSON document: `sender`, `recipient`, `message`, `SNR`, `RSSI`, `FreqErr`
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Capability to publish accepted messages downstream
pub trait Publisher {
    fn publish(&mut self, publication: &Publication) -> Result<()>;
}

impl<P: Publisher + ?Sized> Publisher for Box<P> {
    fn publish(&mut self, publication: &Publication) -> Result<()> {
        (**self).publish(publication)
    }
}

/// Fan-out: both publishers always see the message; the first error wins
impl<A: Publisher, B: Publisher> Publisher for (A, B) {
    fn publish(&mut self, publication: &Publication) -> Result<()> {
        let first = self.0.publish(publication);
        let second = self.1.publish(publication);
        first.and(second)
    }
}

/// Client connection lifecycle hooks
pub trait TransportEvents {
    fn on_connected(&mut self);

    fn on_disconnected(&mut self);

    /// Data written by a client
    fn on_write(&mut self, data: &[u8]);
}
