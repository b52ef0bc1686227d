//! Session configuration

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::SessionError;

/// Custom destination for formatted log lines
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Connection and logging settings for a [`Session`](crate::Session)
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Receiver host name or address
    pub host: String,
    /// IP control port
    pub port: u16,
    /// Log every decoded status line at info level instead of debug
    pub verbose: bool,
    /// Connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Receives formatted log lines
    ///
    /// Only takes effect through [`init_logging`](crate::init_logging), which
    /// installs it process-wide; a `Session` never reads it.
    #[serde(skip)]
    pub log_sink: Option<LogSink>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 23,
            verbose: false,
            connect_timeout_ms: 5000,
            log_sink: None,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("verbose", &self.verbose)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("log_sink", &self.log_sink.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl SessionConfig {
    /// Config for a receiver at `host:port`, other settings default
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the custom log sink
    pub fn with_log_sink(mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.log_sink = Some(Arc::new(sink));
        self
    }

    /// `host:port` string used to dial the receiver
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connect timeout as a duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Load settings from a JSON file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save settings to a JSON file, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
