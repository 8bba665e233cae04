//! # Frame Dispatcher
//!
//! Decides whether a complete frame is forwarded downstream.
//!
//! A frame is forwarded exactly once when:
//! 1. its captured payload matches the declared length, and
//! 2. it is addressed to this node or to [`BROADCAST`].
//!
//! Everything else is dropped locally. Length mismatches are logged as faults;
//! traffic for other nodes is routine on a shared channel and only traced.

use tracing::{debug, trace, warn};

use super::ChannelQuality;
use crate::config::NodeConfig;
use crate::protocol::frame::{Address, Frame, BROADCAST};
use crate::transport::{Publication, Publisher};

/// Result of dispatching one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Handed to the publisher
    Forwarded,
    /// Addressed to another node
    NotForUs,
    /// Payload length does not match the header
    Malformed,
    /// Accepted, but the publisher reported an error
    PublishFailed,
}

/// Dispatcher counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub forwarded: u64,
    pub not_for_us: u64,
    pub malformed: u64,
    pub publish_failed: u64,
}

/// Validates frames and forwards accepted ones to a [`Publisher`]
#[derive(Debug)]
pub struct Dispatcher<P> {
    address: Address,
    publisher: P,
    stats: DispatchStats,
}

impl<P: Publisher> Dispatcher<P> {
    /// Create a dispatcher for the node described by `node`
    pub fn new(node: &NodeConfig, publisher: P) -> Self {
        Self {
            address: node.address,
            publisher,
            stats: DispatchStats::default(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }

    /// Validate and forward one frame
    ///
    /// The frame is consumed, so its payload cannot leak into later dispatches.
    pub fn dispatch(&mut self, frame: Frame, quality: ChannelQuality) -> DispatchOutcome {
        if !frame.is_consistent() {
            warn!(
                "Dropping frame from 0x{:02X}: declared length {} but captured {} bytes",
                frame.sender,
                frame.length,
                frame.payload.len()
            );
            self.stats.malformed += 1;
            return DispatchOutcome::Malformed;
        }

        if !frame.is_for(self.address) {
            trace!(
                "Frame 0x{:02X} -> 0x{:02X} is not for 0x{:02X}",
                frame.sender,
                frame.recipient,
                self.address
            );
            self.stats.not_for_us += 1;
            return DispatchOutcome::NotForUs;
        }

        debug!(
            "0x{:02X} -> 0x{:02X} : {} bytes | SNR: {} | RSSI: {} | FreqErr: {}{}",
            frame.sender,
            frame.recipient,
            frame.length,
            quality.snr,
            quality.rssi,
            quality.freq_err,
            if frame.recipient == BROADCAST { " (broadcast)" } else { "" }
        );

        let publication = Publication::from_frame(frame, quality);
        match self.publisher.publish(&publication) {
            Ok(()) => {
                self.stats.forwarded += 1;
                DispatchOutcome::Forwarded
            }
            Err(e) => {
                warn!("Failed to publish frame from 0x{:02X}: {}", publication.sender, e);
                self.stats.publish_failed += 1;
                DispatchOutcome::PublishFailed
            }
        }
    }
}
