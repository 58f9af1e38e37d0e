use authloop_protocol::ProtocolError;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, refused connection,
    /// timeout, interrupted body).
    #[error("remote authority unreachable: {0}")]
    Unreachable(String),

    /// The remote authority answered with a non-success HTTP status and
    /// no error body.
    #[error("remote authority answered HTTP {0}")]
    Status(u16),

    /// The HTTP client could not be constructed.
    #[error("http client setup failed: {0}")]
    Setup(String),

    /// A body or record could not be (de)serialized.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Reading or writing the identity store failed.
    #[error("identity store failed: {0}")]
    Store(#[source] std::io::Error),
}
