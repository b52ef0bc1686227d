//! Receiver Simulation Library
//!
//! This crate provides a simulation layer for exercising the receiver
//! control protocol without physical hardware. It includes:
//!
//! - **VirtualReceiver**: Applies wire commands to simulated state and
//!   answers with protocol-accurate status lines
//! - **run_virtual_receiver_task**: Serves a VirtualReceiver over any async
//!   byte stream, such as one half of `tokio::io::duplex()`
//!
//! # Example
//!
//! ```rust
//! use vsx_sim::VirtualReceiver;
//!
//! let mut receiver = VirtualReceiver::new("VSX-2021");
//!
//! assert_eq!(receiver.process_line("PF"), vec!["PWR1"]);
//! assert_eq!(receiver.process_line("?V"), vec!["VOL121"]);
//! ```

pub mod receiver;
pub mod receiver_task;

pub use receiver::{VirtualReceiver, VirtualReceiverConfig};
pub use receiver_task::{run_virtual_receiver_task, VirtualReceiverCommand};
