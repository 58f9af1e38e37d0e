//! Codec trait and implementations for serializing/deserializing payloads.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The HTTP endpoint uses it for request and response bodies, and the file
//! store uses it for the remembered identity record.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// - `Send + Sync` → safe to share between the worker and its spawned
///   request tasks.
/// - `'static` → the codec owns everything it needs.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// The remote authority speaks JSON, so this is the only codec the
/// workspace needs.
///
/// ## Example
///
/// ```rust
/// use authloop_protocol::{AuthRequest, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&AuthRequest::Status).unwrap();
/// assert_eq!(bytes, br#"{"cmd":"status"}"#);
///
/// let decoded: AuthRequest = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, AuthRequest::Status);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthOutcome, AuthResponse, UserId};

    #[test]
    fn test_decode_server_reply_fills_defaults() {
        let codec = JsonCodec;

        let reply: AuthResponse = codec
            .decode(br#"{"status":"ok","user_id":7}"#)
            .expect("should decode");

        assert_eq!(reply.status, AuthOutcome::Ok);
        assert_eq!(reply.user_id, Some(UserId(7)));
        assert!(!reply.is_authenticated);
        assert!(reply.preferences.is_empty());
    }

    #[test]
    fn test_decode_non_json_returns_decode_error() {
        let codec = JsonCodec;

        let result: Result<AuthResponse, _> =
            codec.decode(b"<html>502 Bad Gateway</html>");

        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
