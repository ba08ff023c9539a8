//! Error types shared across the client.
//!
//! None of these are fatal. Transport failures only flip the session status,
//! decode failures drop a single inbound frame, and send failures are
//! reported to the caller that tried to send.

/// Failures raised by a [`Connector`](crate::state::connection::Connector)
/// or the channel it opened.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The channel could not be opened.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The channel was already torn down by the transport.
    #[error("channel closed")]
    Closed,
}

/// Why an outbound action or message was not sent.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The session is not in the `connected` state.
    #[error("not connected")]
    NotConnected,

    /// The payload could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// The transport refused the frame.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// An inbound payload did not match the shape its event name promises.
#[derive(Debug, thiserror::Error)]
#[error("malformed `{event}` payload: {source}")]
pub struct DecodeError {
    /// Name of the event whose payload was rejected.
    pub event: &'static str,
    #[source]
    pub source: serde_json::Error,
}

impl DecodeError {
    pub fn new(event: &'static str, source: serde_json::Error) -> Self {
        Self { event, source }
    }
}
