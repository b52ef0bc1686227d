//! Error types for receiver protocol decoding

use thiserror::Error;

/// Errors that can occur while decoding a status line
///
/// These never escape the decoder as failures: a line that fails to parse is
/// logged and surfaced as [`DecodedEvent::Unclassified`](crate::DecodedEvent::Unclassified).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Line ends before its payload starts
    #[error("{prefix} line has no payload")]
    MissingPayload { prefix: &'static str },

    /// Payload is not a valid decimal number
    #[error("invalid {prefix} payload: {payload:?}")]
    InvalidNumber {
        prefix: &'static str,
        payload: String,
    },
}
