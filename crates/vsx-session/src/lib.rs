//! Receiver Session Library
//!
//! This crate binds one receiver connection to the protocol codec and
//! exposes it as an async, observer-based facade.
//!
//! # Architecture
//!
//! - A [`Session`] handle queues commands on an unbounded channel, so callers
//!   never block on the transport
//! - A spawned session task owns the stream and the codec; it wakes the
//!   receiver, requests full status, and decodes every inbound line
//! - All activity is published as [`SessionEvent`]s on a broadcast bus;
//!   observers subscribe to everything or to a single [`EventName`]
//!
//! # Example
//!
//! ```rust,no_run
//! use vsx_protocol::EventName;
//! use vsx_session::{Session, SessionConfig, SessionEvent};
//!
//! # async fn example() -> Result<(), vsx_session::SessionError> {
//! let mut session = Session::new(SessionConfig::new("192.168.1.50", 23));
//! let mut volume = session.subscribe_to(EventName::Volume);
//!
//! session.open().await?;
//! session.volume(-35.5)?;
//!
//! while let Some(SessionEvent::Decoded(event)) = volume.recv().await {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod session;
pub mod transport;

pub use config::{LogSink, SessionConfig};
pub use error::SessionError;
pub use events::{SessionEvent, Subscription};
pub use logging::{init_logging, SinkLayer};
pub use session::{Session, STAGGER_INTERVAL, WAKE_DELAY};
pub use transport::connect_tcp;
