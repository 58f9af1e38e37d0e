//! Unified error type for authloop.

use authloop_protocol::ProtocolError;
use authloop_transport::TransportError;

/// Top-level error that wraps the sub-crate errors.
///
/// Failed auth requests never show up here; the worker records those on
/// the session snapshot. This is only for setting things up and for
/// talking to a worker that has stopped.
#[derive(Debug, thiserror::Error)]
pub enum AuthloopError {
    /// Building an endpoint or reading the identity store failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A bus payload could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The worker has shut down; its handle can no longer reach it.
    #[error("auth worker is not running")]
    Unavailable,
}
