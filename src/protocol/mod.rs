//! # Radio Framing Protocol
//!
//! Addressed, length-prefixed framing shared by every node on the radio channel.
//!
//! This module handles:
//! - Frame construction with sender/recipient/length header
//! - One-shot decoding of a buffered frame
//! - Incremental, non-blocking frame reassembly from a byte stream

pub mod frame;
pub mod parser;
