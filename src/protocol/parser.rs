//! # Incremental Frame Parser
//!
//! Reassembles frames from a byte stream that may deliver data in arbitrarily
//! small pieces. The parser never blocks: each [`FrameParser::poll`] consumes
//! whatever is available and returns as soon as one frame completes or the
//! source runs dry. Partial header and payload state survive across polls.
//!
//! ## States
//!
//! ```text
//! Idle --byte--> HeaderPartial --3rd byte--> PayloadPartial --length bytes--> (emit) Idle
//!                                 \--length == 0--> (emit) Idle
//! ```
//!
//! ## Resynchronization
//!
//! The protocol has no sync byte. When a partial frame receives no new byte for
//! the configured stale timeout it is discarded and the parser returns to
//! `Idle`, so the next burst from a sender is read as a fresh header.

use bytes::{Buf, BytesMut};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::frame::{Address, Frame, HEADER_SIZE, MAX_FRAME_SIZE};

/// Non-blocking byte source
///
/// Reports how many bytes are ready and hands them out one at a time.
pub trait ByteSource {
    /// Number of bytes that can be read without waiting
    fn available(&self) -> usize;

    /// Consume one byte, or `None` if nothing is available
    fn read_byte(&mut self) -> Option<u8>;
}

/// Receive buffer filled by the serial reader and drained by the parser
#[derive(Debug, Default)]
pub struct RxBuffer {
    buf: BytesMut,
}

impl RxBuffer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(MAX_FRAME_SIZE * 2),
        }
    }

    /// Append received bytes
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Mutable access for `AsyncReadExt::read_buf`
    pub fn as_bytes_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl ByteSource for RxBuffer {
    fn available(&self) -> usize {
        self.buf.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.buf.has_remaining() {
            Some(self.buf.get_u8())
        } else {
            None
        }
    }
}

/// Parser state between polls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserState {
    /// No bytes of the current frame consumed
    Idle,

    /// Some of sender/recipient/length consumed
    HeaderPartial {
        header: [u8; HEADER_SIZE],
        filled: usize,
    },

    /// Header complete, collecting `length` payload bytes
    PayloadPartial {
        sender: Address,
        recipient: Address,
        length: u8,
        payload: Vec<u8>,
    },
}

/// Parser counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParserStats {
    /// Frames emitted
    pub frames: u64,
    /// Partial frames discarded after the stale timeout
    pub stale: u64,
}

/// Incremental frame parser
#[derive(Debug)]
pub struct FrameParser {
    state: ParserState,
    stale_after: Option<Duration>,
    last_byte_at: Option<Instant>,
    stats: ParserStats,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new(None)
    }
}

impl FrameParser {
    /// Create a parser
    ///
    /// # Arguments
    ///
    /// * `stale_after` - Discard a partial frame after this much silence.
    ///   `None` keeps partial state forever.
    pub fn new(stale_after: Option<Duration>) -> Self {
        Self {
            state: ParserState::Idle,
            stale_after,
            last_byte_at: None,
            stats: ParserStats::default(),
        }
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == ParserState::Idle
    }

    pub fn stats(&self) -> ParserStats {
        self.stats
    }

    /// Drop any partial frame and return to `Idle`
    pub fn reset(&mut self) {
        self.state = ParserState::Idle;
        self.last_byte_at = None;
    }

    /// Consume available bytes until one frame completes
    ///
    /// # Arguments
    ///
    /// * `source` - Byte source to drain
    /// * `now` - Current time, used for stale-frame expiry
    ///
    /// # Returns
    ///
    /// * `Option<Frame>` - A complete frame, or `None` if the source ran dry first.
    ///   Call again to pick up further frames already buffered.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Instant;
    /// use imu_relay::protocol::parser::{FrameParser, RxBuffer};
    ///
    /// let mut parser = FrameParser::default();
    /// let mut rx = RxBuffer::new();
    ///
    /// rx.extend(&[0x02, 0xFF]);
    /// assert!(parser.poll(&mut rx, Instant::now()).is_none());
    ///
    /// rx.extend(&[0x02, b'h', b'i']);
    /// let frame = parser.poll(&mut rx, Instant::now()).unwrap();
    /// assert_eq!(frame.payload, b"hi");
    /// ```
    pub fn poll<S: ByteSource + ?Sized>(&mut self, source: &mut S, now: Instant) -> Option<Frame> {
        self.expire_stale(now);

        while source.available() > 0 {
            let Some(byte) = source.read_byte() else {
                break;
            };
            self.last_byte_at = Some(now);

            if let Some(frame) = self.push(byte) {
                self.stats.frames += 1;
                return Some(frame);
            }
        }

        None
    }

    fn expire_stale(&mut self, now: Instant) {
        if self.is_idle() {
            return;
        }

        let (Some(limit), Some(last)) = (self.stale_after, self.last_byte_at) else {
            return;
        };

        if now.saturating_duration_since(last) >= limit {
            warn!("Discarding partial frame after {:?} of silence: {:?}", limit, self.state);
            self.stats.stale += 1;
            self.reset();
        }
    }

    /// Feed one byte through the state machine
    fn push(&mut self, byte: u8) -> Option<Frame> {
        match std::mem::replace(&mut self.state, ParserState::Idle) {
            ParserState::Idle => {
                let mut header = [0u8; HEADER_SIZE];
                header[0] = byte;
                self.state = ParserState::HeaderPartial { header, filled: 1 };
                None
            }
            ParserState::HeaderPartial { mut header, filled } => {
                header[filled] = byte;
                let filled = filled + 1;

                if filled < HEADER_SIZE {
                    self.state = ParserState::HeaderPartial { header, filled };
                    return None;
                }

                let [sender, recipient, length] = header;
                debug!(
                    "Header: sender=0x{:02X} recipient=0x{:02X} length={}",
                    sender, recipient, length
                );

                self.begin_payload(sender, recipient, length, Vec::with_capacity(length as usize))
            }
            ParserState::PayloadPartial {
                sender,
                recipient,
                length,
                mut payload,
            } => {
                payload.push(byte);
                self.begin_payload(sender, recipient, length, payload)
            }
        }
    }

    fn begin_payload(
        &mut self,
        sender: Address,
        recipient: Address,
        length: u8,
        payload: Vec<u8>,
    ) -> Option<Frame> {
        if payload.len() == length as usize {
            self.last_byte_at = None;
            return Some(Frame {
                sender,
                recipient,
                length,
                payload,
            });
        }

        self.state = ParserState::PayloadPartial {
            sender,
            recipient,
            length,
            payload,
        };
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::BROADCAST;

    fn drain(parser: &mut FrameParser, rx: &mut RxBuffer, now: Instant) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(frame) = parser.poll(rx, now) {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_idle_when_empty() {
        let mut parser = FrameParser::default();
        let mut rx = RxBuffer::new();
        assert!(parser.poll(&mut rx, Instant::now()).is_none());
        assert!(parser.is_idle());
    }

    #[test]
    fn test_single_frame_in_one_poll() {
        let frame = Frame::new(0x02, BROADCAST, b"abc".to_vec()).unwrap();
        let mut parser = FrameParser::default();
        let mut rx = RxBuffer::new();
        rx.extend(&frame.to_bytes());

        let parsed = parser.poll(&mut rx, Instant::now()).unwrap();
        assert_eq!(parsed, frame);
        assert!(parser.is_idle());
        assert!(rx.is_empty());
        assert_eq!(parser.stats().frames, 1);
    }

    #[test]
    fn test_header_starved_after_sender() {
        let mut parser = FrameParser::default();
        let mut rx = RxBuffer::new();
        let now = Instant::now();

        rx.extend(&[0x02]);
        assert!(parser.poll(&mut rx, now).is_none());
        assert_eq!(
            parser.state(),
            &ParserState::HeaderPartial {
                header: [0x02, 0, 0],
                filled: 1
            }
        );

        // Nothing new arrives: state must hold, nothing consumed
        assert!(parser.poll(&mut rx, now).is_none());
        assert!(!parser.is_idle());

        rx.extend(&[0x01]);
        assert!(parser.poll(&mut rx, now).is_none());

        rx.extend(&[0x01, b'z']);
        let frame = parser.poll(&mut rx, now).unwrap();
        assert_eq!(frame.sender, 0x02);
        assert_eq!(frame.recipient, 0x01);
        assert_eq!(frame.payload, b"z");
    }

    #[test]
    fn test_zero_length_frame() {
        let mut parser = FrameParser::default();
        let mut rx = RxBuffer::new();
        rx.extend(&[0x03, BROADCAST, 0x00, 0x04, BROADCAST, 0x01, b'q']);

        let frames = drain(&mut parser, &mut rx, Instant::now());
        assert_eq!(frames.len(), 2);
        assert!(frames[0].payload.is_empty());
        assert_eq!(frames[0].length, 0);
        assert_eq!(frames[1].sender, 0x04);
        assert_eq!(frames[1].payload, b"q");
    }

    #[test]
    fn test_back_to_back_frames_byte_at_a_time() {
        let first = Frame::new(0x02, BROADCAST, b"{\"x\":1.0000}".to_vec()).unwrap();
        let second = Frame::new(0x03, 0x01, vec![0xFF, 0x00, 0xFF, 0x03]).unwrap();

        let mut stream = first.to_bytes();
        stream.extend(second.to_bytes());

        let mut parser = FrameParser::default();
        let mut rx = RxBuffer::new();
        let now = Instant::now();
        let mut frames = Vec::new();

        for byte in stream {
            rx.extend(&[byte]);
            frames.extend(drain(&mut parser, &mut rx, now));
        }

        assert_eq!(frames, vec![first, second]);
        assert!(parser.is_idle());
    }

    #[test]
    fn test_back_to_back_frames_single_chunk() {
        let first = Frame::new(0x02, BROADCAST, vec![7; 255]).unwrap();
        let second = Frame::new(0x02, BROADCAST, vec![9; 3]).unwrap();

        let mut rx = RxBuffer::new();
        rx.extend(&first.to_bytes());
        rx.extend(&second.to_bytes());

        let mut parser = FrameParser::default();
        let frames = drain(&mut parser, &mut rx, Instant::now());
        assert_eq!(frames, vec![first, second]);
    }

    #[test]
    fn test_truncated_payload_is_not_emitted() {
        let mut parser = FrameParser::default();
        let mut rx = RxBuffer::new();
        rx.extend(&[0x02, BROADCAST, 0x05, b'a', b'b', b'c']);

        assert!(parser.poll(&mut rx, Instant::now()).is_none());
        match parser.state() {
            ParserState::PayloadPartial { length, payload, .. } => {
                assert_eq!(*length, 5);
                assert_eq!(payload, b"abc");
            }
            other => panic!("Expected PayloadPartial, got: {:?}", other),
        }
    }

    #[test]
    fn test_stale_partial_frame_is_discarded() {
        let timeout = Duration::from_millis(500);
        let mut parser = FrameParser::new(Some(timeout));
        let mut rx = RxBuffer::new();
        let t0 = Instant::now();

        // Declares 5 bytes, only 3 arrive before the sender goes quiet
        rx.extend(&[0x02, BROADCAST, 0x05, b'a', b'b', b'c']);
        assert!(parser.poll(&mut rx, t0).is_none());

        // Still within the timeout: partial state is kept
        assert!(parser.poll(&mut rx, t0 + Duration::from_millis(100)).is_none());
        assert!(!parser.is_idle());

        // Next burst arrives after the gap and must parse cleanly
        let next = Frame::new(0x03, BROADCAST, b"ok".to_vec()).unwrap();
        rx.extend(&next.to_bytes());
        let parsed = parser.poll(&mut rx, t0 + timeout + Duration::from_millis(1));

        assert_eq!(parsed, Some(next));
        assert_eq!(parser.stats().stale, 1);
    }

    #[test]
    fn test_no_timeout_keeps_partial_state() {
        let mut parser = FrameParser::new(None);
        let mut rx = RxBuffer::new();
        let t0 = Instant::now();

        rx.extend(&[0x02, BROADCAST]);
        assert!(parser.poll(&mut rx, t0).is_none());
        assert!(parser.poll(&mut rx, t0 + Duration::from_secs(3600)).is_none());
        assert!(!parser.is_idle());
        assert_eq!(parser.stats().stale, 0);
    }

    #[test]
    fn test_reset() {
        let mut parser = FrameParser::default();
        let mut rx = RxBuffer::new();
        rx.extend(&[0x02, BROADCAST, 0x09, 1, 2]);
        parser.poll(&mut rx, Instant::now());
        assert!(!parser.is_idle());

        parser.reset();
        assert!(parser.is_idle());
    }

    #[test]
    fn test_payload_buffer_not_reused_between_frames() {
        let long = Frame::new(0x02, BROADCAST, b"0123456789".to_vec()).unwrap();
        let short = Frame::new(0x02, BROADCAST, b"ab".to_vec()).unwrap();

        let mut rx = RxBuffer::new();
        rx.extend(&long.to_bytes());
        rx.extend(&short.to_bytes());

        let mut parser = FrameParser::default();
        let frames = drain(&mut parser, &mut rx, Instant::now());
        assert_eq!(frames[1].payload, b"ab");
    }
}
