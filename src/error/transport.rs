use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection to {addr} failed: {reason}")]
    Connect { addr: String, reason: String },
    #[error("Timed out connecting to {addr} after {timeout_ms}ms.")]
    ConnectTimeout { addr: String, timeout_ms: u64 },
    #[error("Subscribe to '{filter}' failed: {reason}")]
    Subscribe { filter: String, reason: String },
    #[error("Unsubscribe from '{filter}' failed: {reason}")]
    Unsubscribe { filter: String, reason: String },
    #[error("Publish to '{topic}' failed: {reason}")]
    Publish { topic: String, reason: String },
    #[error("Disconnect failed: {reason}")]
    Disconnect { reason: String },
    #[error("Connection lost: {reason}")]
    Disconnected { reason: String },
    #[error("Inbound channel closed.")]
    InboundClosed,
    #[error("Client session '{client_id}' is no longer attached to the broker.")]
    SessionClosed { client_id: String },
}
