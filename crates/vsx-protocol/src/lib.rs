//! Pioneer Receiver Protocol Library
//!
//! This crate provides encoding and decoding for the line-oriented ASCII
//! control protocol spoken by Pioneer AV receivers over their IP control
//! port:
//!
//! - **Command encoding**: typed [`CommandIntent`]s to exact wire lines, with
//!   dB scaling, clamping and zero-padding
//! - **Line framing**: reassembly of `\r`-terminated lines from a chunked
//!   byte stream
//! - **Status decoding**: prefix dispatch of status lines into typed
//!   [`DecodedEvent`]s, including listening mode display codes and learned
//!   input names
//!
//! The crate performs no I/O. Pair it with a transport (see `vsx-session`).
//!
//! # Example
//!
//! ```rust
//! use vsx_protocol::{CommandIntent, DecodedEvent, ReceiverCodec};
//!
//! let encoded = CommandIntent::VolumeSet { db: Some(-40.0) }.encode();
//! assert_eq!(encoded.lines[0], b"081VL\r");
//!
//! let mut codec = ReceiverCodec::new();
//! codec.push_bytes(b"VOL081\r");
//! assert_eq!(codec.next_event(), Some(DecodedEvent::VolumeChanged { db: -40.0 }));
//! ```

pub mod command;
pub mod decoder;
pub mod error;
pub mod event;
pub mod framer;
pub mod tables;

pub use command::{CommandIntent, Direction, EncodedCommand, Query, TERMINATOR};
pub use decoder::{LearnedInputNames, ReceiverCodec, ResponseDecoder};
pub use error::ParseError;
pub use event::{DecodedEvent, EventName};
pub use framer::LineFramer;
pub use tables::{HmgButton, UNKNOWN_LISTENING_MODE};

/// Trait for single wire values that encode to exactly one line
pub trait EncodeCommand {
    /// Encode this value to its wire format, terminator included
    fn encode(&self) -> Vec<u8>;
}
