//! TCP transport to the receiver's IP control port

use std::time::Duration;

use tokio::net::TcpStream;

use crate::SessionError;

/// Connect to `endpoint` (`host:port`) within `timeout`
///
/// Nagle's algorithm is disabled; command lines are tiny and latency matters
/// more than throughput.
pub async fn connect_tcp(endpoint: &str, timeout: Duration) -> Result<TcpStream, SessionError> {
    tracing::debug!(
        endpoint = %endpoint,
        timeout_ms = timeout.as_millis(),
        "Connecting to receiver"
    );

    let stream = tokio::time::timeout(timeout, TcpStream::connect(endpoint))
        .await
        .map_err(|_| {
            tracing::warn!(endpoint = %endpoint, "Receiver connection timed out");
            SessionError::ConnectTimeout {
                endpoint: endpoint.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }
        })?
        .map_err(|e| {
            tracing::warn!(endpoint = %endpoint, error = %e, "Receiver connection failed");
            SessionError::Io(e)
        })?;

    if let Err(e) = stream.set_nodelay(true) {
        tracing::warn!(endpoint = %endpoint, error = %e, "Failed to set TCP_NODELAY");
    }

    tracing::info!(endpoint = %endpoint, "Connected to receiver");
    Ok(stream)
}
