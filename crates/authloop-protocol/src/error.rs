//! Error types for the protocol layer.
//!
//! Each crate in authloop defines its own error enum. A `ProtocolError`
//! always means a payload had the wrong shape, never that the network
//! or the state machine misbehaved.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes or JSON).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes or JSON into a Rust value).
    ///
    /// Common causes: a non-JSON body from the remote authority, a bus
    /// payload with missing fields, or a truncated store file.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The payload parsed but violates the protocol, e.g. a bus message
    /// delivered on a topic the worker does not understand.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
