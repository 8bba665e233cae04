//! # Base Station
//!
//! Receive-side tick: drain the byte source through the frame parser and hand
//! every complete frame to the dispatcher together with the link quality.

use std::time::{Duration, Instant};

use super::dispatcher::{DispatchOutcome, DispatchStats, Dispatcher};
use super::QualitySource;
use crate::config::{NodeConfig, ReceiverConfig};
use crate::protocol::parser::{ByteSource, FrameParser, ParserStats};
use crate::transport::Publisher;

/// Parser + dispatcher pair owned by the base node
#[derive(Debug)]
pub struct BaseStation<P, Q> {
    parser: FrameParser,
    dispatcher: Dispatcher<P>,
    quality: Q,
}

impl<P: Publisher, Q: QualitySource> BaseStation<P, Q> {
    pub fn new(node: &NodeConfig, receiver: &ReceiverConfig, publisher: P, quality: Q) -> Self {
        let stale_after = match receiver.frame_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        Self {
            parser: FrameParser::new(stale_after),
            dispatcher: Dispatcher::new(node, publisher),
            quality,
        }
    }

    /// Parse and dispatch every frame currently available
    ///
    /// Never waits for bytes. Returns the number of frames forwarded.
    pub fn tick<S: ByteSource + ?Sized>(&mut self, source: &mut S, now: Instant) -> usize {
        let mut forwarded = 0;

        while let Some(frame) = self.parser.poll(source, now) {
            let quality = self.quality.channel_quality();
            if self.dispatcher.dispatch(frame, quality) == DispatchOutcome::Forwarded {
                forwarded += 1;
            }
        }

        forwarded
    }

    pub fn parser_stats(&self) -> ParserStats {
        self.parser.stats()
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    pub fn publisher(&self) -> &P {
        self.dispatcher.publisher()
    }
}
