//! Virtual receiver actor task
//!
//! This module provides a pure async task that owns a VirtualReceiver and
//! talks to a controller over an async stream. The task uses a select! loop to:
//! - Frame command lines from the stream and answer them
//! - Push unsolicited status lines on request (e.g. a remote key press)
//! - Handle shutdown commands from a channel
//! - Broadcast every received command line for inspection

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use vsx_protocol::LineFramer;

use crate::VirtualReceiver;

/// Commands that can be sent to a virtual receiver actor
#[derive(Debug, Clone)]
pub enum VirtualReceiverCommand {
    /// Send status lines without being asked, as if changed on the front panel
    Announce(Vec<String>),
    /// Shutdown the virtual receiver actor
    Shutdown,
}

/// Run the virtual receiver actor task
///
/// Replies are terminated with `\r\n`, as the hardware does. Every command
/// line received (the wake line excepted) is sent on `line_tx`.
pub async fn run_virtual_receiver_task<S>(
    mut stream: S,
    mut receiver: VirtualReceiver,
    mut cmd_rx: mpsc::Receiver<VirtualReceiverCommand>,
    line_tx: broadcast::Sender<String>,
) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framer = LineFramer::new();
    let mut buf = [0u8; 1024];

    info!("Starting virtual receiver task for {}", receiver.id());

    loop {
        tokio::select! {
            result = stream.read(&mut buf) => {
                match result {
                    Ok(0) => {
                        debug!("Virtual receiver stream closed for {}", receiver.id());
                        break;
                    }
                    Ok(n) => {
                        framer.push_bytes(&buf[..n]);
                        while let Some(line) = framer.next_line() {
                            if !line.is_empty() {
                                let _ = line_tx.send(line.clone());
                            }
                            let replies = receiver.process_line(&line);
                            write_lines(&mut stream, &replies).await?;
                        }
                    }
                    Err(e) => {
                        warn!("Virtual receiver {} stream error: {}", receiver.id(), e);
                        return Err(e);
                    }
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(VirtualReceiverCommand::Announce(lines)) => {
                        debug!("Virtual receiver {} announcing {:?}", receiver.id(), lines);
                        write_lines(&mut stream, &lines).await?;
                    }
                    Some(VirtualReceiverCommand::Shutdown) => {
                        info!("Shutdown requested for virtual receiver {}", receiver.id());
                        break;
                    }
                    None => {
                        debug!("Command channel closed for virtual receiver {}", receiver.id());
                        break;
                    }
                }
            }
        }
    }

    info!("Virtual receiver task ended for {}", receiver.id());
    Ok(())
}

async fn write_lines<S>(stream: &mut S, lines: &[String]) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    if lines.is_empty() {
        return Ok(());
    }
    let mut out = Vec::new();
    for line in lines {
        out.extend_from_slice(line.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    stream.write_all(&out).await?;
    stream.flush().await
}
