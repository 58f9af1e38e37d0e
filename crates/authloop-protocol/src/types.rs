//! Core types exchanged with the remote authority.
//!
//! The remote authority is a single JSON endpoint. Every request is a
//! command object (`{"cmd": "status"}`, `{"cmd": "logon", ...}`) and every
//! reply describes who the server thinks the caller is.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// The identifier of an authenticated user, as issued by the remote
/// authority.
///
/// `#[serde(transparent)]` keeps it a bare number on the wire, so
/// `UserId(42)` is `42` in JSON. An anonymous visitor is represented by
/// `Option<UserId>::None` (JSON `null`), never by a sentinel id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// Free-form user preferences returned with an identity (language,
/// timezone, ...). Opaque to this crate.
pub type Preferences = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Auth outcome and info
// ---------------------------------------------------------------------------

/// The remote authority's verdict on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthOutcome {
    /// The request succeeded and the identity fields are authoritative.
    Ok,
    /// No answer yet. This is the value before the first reply arrives.
    #[default]
    Pending,
    /// The request failed; see [`AuthResponse::error`].
    Error,
}

/// The remote authority's last answer, as held by the session.
///
/// This is also the payload of the `auth` and `auth-sync` bus topics, so
/// sibling contexts see exactly what this context saw.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthInfo {
    /// Verdict of the answer this info came from.
    #[serde(rename = "status", default)]
    pub outcome: AuthOutcome,
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl AuthInfo {
    /// Returns `true` if this info came from a successful answer.
    pub fn is_ok(&self) -> bool {
        self.outcome == AuthOutcome::Ok
    }
}

/// A reply from the remote authority.
///
/// Identical to [`AuthInfo`] plus the optional `error` reason the server
/// sends with `{"status": "error"}` (e.g. `"pw"` for a wrong password).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub status: AuthOutcome,
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthResponse {
    /// A successful reply for the given user (or anonymous when `None`).
    pub fn ok(user_id: Option<UserId>) -> Self {
        Self {
            status: AuthOutcome::Ok,
            is_authenticated: user_id.is_some(),
            user_id,
            ..Self::default()
        }
    }

    /// A failed reply carrying the server's reason.
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            status: AuthOutcome::Error,
            error: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Drops the error reason and keeps the identity fields.
    pub fn into_info(self) -> AuthInfo {
        AuthInfo {
            outcome: self.status,
            is_authenticated: self.is_authenticated,
            user_id: self.user_id,
            username: self.username,
            preferences: self.preferences,
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// The four commands the remote authority understands.
///
/// Used as a compact tag on completions so the session can tell which
/// kind of call just finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Status,
    Refresh,
    Logon,
    Logoff,
}

impl Command {
    /// `status` and `refresh` are identity checks; `logon` and `logoff`
    /// are user-initiated.
    pub fn is_check(self) -> bool {
        matches!(self, Self::Status | Self::Refresh)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status => write!(f, "status"),
            Self::Refresh => write!(f, "refresh"),
            Self::Logon => write!(f, "logon"),
            Self::Logoff => write!(f, "logoff"),
        }
    }
}

/// Logon credentials. Absent fields are omitted from the request body.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Second-factor code, when the account requires one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passcode: Option<String>,
}

// Credentials end up in tracing output via `?request`, so never print secrets.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("passcode", &redact(&self.passcode))
            .finish()
    }
}

/// A request body for the remote authority.
///
/// `#[serde(tag = "cmd")]` produces the flat shape the server expects:
/// `{"cmd": "logon", "username": "a", "password": "p"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum AuthRequest {
    /// Ask who the current session belongs to.
    Status,
    /// Like `Status`, but also extends the session token's lifetime.
    Refresh,
    /// Authenticate with credentials.
    Logon(Credentials),
    /// End the current session.
    Logoff,
}

impl AuthRequest {
    /// The command tag of this request.
    pub fn command(&self) -> Command {
        match self {
            Self::Status => Command::Status,
            Self::Refresh => Command::Refresh,
            Self::Logon(_) => Command::Logon,
            Self::Logoff => Command::Logoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logon_request_serializes_flat_with_cmd_tag() {
        let req = AuthRequest::Logon(Credentials {
            username: Some("a".into()),
            password: Some("p".into()),
            passcode: None,
        });

        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "cmd": "logon", "username": "a", "password": "p" })
        );
    }

    #[test]
    fn test_refresh_request_serializes_cmd_only() {
        let json = serde_json::to_value(AuthRequest::Refresh).unwrap();
        assert_eq!(json, serde_json::json!({ "cmd": "refresh" }));
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let creds = Credentials {
            username: Some("alice".into()),
            password: Some("hunter2".into()),
            passcode: Some("123456".into()),
        };

        let printed = format!("{creds:?}");

        assert!(printed.contains("alice"));
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("123456"));
    }

    #[test]
    fn test_auth_info_uses_status_key_on_the_wire() {
        let info = AuthResponse::ok(Some(UserId(42))).into_info();

        let json = serde_json::to_value(&info).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["user_id"], 42);
        assert_eq!(json["is_authenticated"], true);
    }

    #[test]
    fn test_error_reply_keeps_reason() {
        let reply: AuthResponse =
            serde_json::from_str(r#"{"status":"error","error":"pw"}"#).unwrap();

        assert_eq!(reply.status, AuthOutcome::Error);
        assert_eq!(reply.error.as_deref(), Some("pw"));
        assert_eq!(reply.user_id, None);
    }

    #[test]
    fn test_command_is_check() {
        assert!(Command::Status.is_check());
        assert!(Command::Refresh.is_check());
        assert!(!Command::Logon.is_check());
        assert!(!Command::Logoff.is_check());
    }

    #[test]
    fn test_user_id_display() {
        assert_eq!(UserId(7).to_string(), "U-7");
    }
}
