//! Message bus topics and payloads.
//!
//! The auth worker lives next to other client components that talk over a
//! topic-based bus. This module pins down the topic names and the JSON
//! shape carried on each one.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{AuthInfo, Credentials, ProtocolError};

/// Topic names, grouped by direction.
pub mod topics {
    // -- Inbound (the worker subscribes) ----------------------------------

    /// The persistent store's remembered user id changed. Payload: id or null.
    pub const STORE_USER_ID_CHANGED: &str = "model/sessionStorage/event/auth-user-id";
    /// A sibling context announced its resolved identity. Payload: `AuthInfo`.
    pub const SIBLING_SYNC: &str = "model/serviceWorker/event/auth-sync";
    /// Application-level logon request. Payload: `LogonRequest`.
    pub const LOGON: &str = "model/auth/post/logon";
    /// Logon request coming from a form submit. Payload: `LogonForm`.
    pub const LOGON_FORM: &str = "model/auth/post/logon/form";
    /// Application-level logoff request. Payload: `LogoffRequest`.
    pub const LOGOFF: &str = "model/auth/post/logoff";
    /// UI activity signal. Payload: `ActivityEvent`.
    pub const RECENT_ACTIVITY: &str = "model/ui/event/recent-activity";

    /// Every topic the worker subscribes to on its first run.
    pub const INBOUND: [&str; 6] = [
        STORE_USER_ID_CHANGED,
        SIBLING_SYNC,
        LOGON,
        LOGON_FORM,
        LOGOFF,
        RECENT_ACTIVITY,
    ];

    // -- Outbound (the worker publishes) ----------------------------------

    /// The identity is about to change. Payload: `AuthChanging`.
    pub const AUTH_CHANGING: &str = "model/auth/event/auth-changing";
    /// The resolved identity. Payload: id or null.
    pub const AUTH_USER_ID: &str = "model/auth/event/auth-user-id";
    /// Resolved identity for sibling contexts. Payload: `AuthInfo`.
    pub const SIBLING_BROADCAST: &str = "model/serviceWorker/post/broadcast/auth-sync";
    /// Current auth snapshot, published on every render. Payload: `AuthInfo`.
    pub const AUTH: &str = "model/auth/event/auth";
}

/// One message on the bus: a topic and a JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Value,
}

impl BusMessage {
    /// Builds a message by serializing `payload`.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the payload can't be represented
    /// as JSON.
    pub fn new<T: Serialize>(
        topic: &str,
        payload: &T,
    ) -> Result<Self, ProtocolError> {
        let payload =
            serde_json::to_value(payload).map_err(ProtocolError::Encode)?;
        Ok(Self {
            topic: topic.to_string(),
            payload,
        })
    }

    /// Decodes the payload into the type expected for this topic.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the payload has the wrong shape.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        T::deserialize(&self.payload).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// Inbound payloads
// ---------------------------------------------------------------------------

/// A logon request posted by the application.
///
/// `onauth` is an opaque correlation token; it comes back unchanged in the
/// [`AuthChanging`] notification so the caller can match the completion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogonRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onauth: Option<Value>,
}

/// A logon request from a submitted form: the fields sit under `value`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogonForm {
    pub value: LogonRequest,
}

/// A logoff request posted by the application.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogoffRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onauth: Option<Value>,
}

/// User activity signal from the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivityEvent {
    #[serde(default)]
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// Outbound payloads
// ---------------------------------------------------------------------------

/// Published when the session enters `auth_changing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthChanging {
    pub onauth: Option<Value>,
    pub auth: AuthInfo,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::UserId;

    #[test]
    fn test_decode_logon_form_reads_nested_value() {
        let msg = BusMessage {
            topic: topics::LOGON_FORM.into(),
            payload: json!({
                "value": { "username": "a", "password": "p", "onauth": "#done" }
            }),
        };

        let form: LogonForm = msg.decode().expect("should decode");

        assert_eq!(form.value.credentials.username.as_deref(), Some("a"));
        assert_eq!(form.value.credentials.password.as_deref(), Some("p"));
        assert_eq!(form.value.credentials.passcode, None);
        assert_eq!(form.value.onauth, Some(json!("#done")));
    }

    #[test]
    fn test_decode_store_user_id_accepts_null() {
        let msg = BusMessage {
            topic: topics::STORE_USER_ID_CHANGED.into(),
            payload: Value::Null,
        };

        let id: Option<UserId> = msg.decode().expect("should decode");

        assert_eq!(id, None);
    }

    #[test]
    fn test_decode_wrong_shape_returns_decode_error() {
        let msg = BusMessage {
            topic: topics::RECENT_ACTIVITY.into(),
            payload: json!({ "is_active": "very" }),
        };

        let result: Result<ActivityEvent, _> = msg.decode();

        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_new_serializes_payload() {
        let msg = BusMessage::new(topics::AUTH_USER_ID, &Some(UserId(3)))
            .expect("should encode");

        assert_eq!(msg.topic, topics::AUTH_USER_ID);
        assert_eq!(msg.payload, json!(3));
    }

    #[test]
    fn test_inbound_topics_are_distinct_from_outbound() {
        for topic in topics::INBOUND {
            assert_ne!(topic, topics::SIBLING_BROADCAST);
            assert_ne!(topic, topics::AUTH);
        }
    }
}
