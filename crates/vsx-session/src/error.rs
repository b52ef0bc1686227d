//! Error types for the session facade

use thiserror::Error;

/// Errors that can occur while configuring or driving a session
#[derive(Debug, Error)]
pub enum SessionError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection attempt did not finish in time
    #[error("connection to {endpoint} timed out after {timeout_ms}ms")]
    ConnectTimeout {
        /// `host:port` that was dialed
        endpoint: String,
        /// Configured timeout
        timeout_ms: u64,
    },

    /// The session task has ended
    #[error("session is closed")]
    Closed,

    /// A transport is already bound to this session
    #[error("session already has a transport")]
    AlreadyOpen,

    /// Configuration file could not be parsed or written
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}
