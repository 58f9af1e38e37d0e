//! The six states an authentication session can be in.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The current state of the session.
///
/// ```text
///            start
///              │ (first run: status probe)
///              ▼
///   ┌──────► auth_unknown ◄───────────── (user id changed) ── any
///   │          │ ok answer
///   │          ▼
///   │  same id ┌─────────────┐ new id
///   │   ┌──────┤ ok answer   ├────────┐
///   │   ▼      └─────────────┘        ▼
///   │ auth_known ◄──(settled)── auth_changing
///   │   │    ▲
///   │   │    └── ok answer ──┐
///   │   ▼ logon/logoff       │
///   │ authenticating ────────┘
///   │   │ error
///   │   ▼
///   └ auth_error
/// ```
///
/// - **Start**: nothing has happened yet; subscriptions are not registered.
/// - **AuthUnknown**: a status probe is out; who the user is is unknown.
/// - **Authenticating**: a logon or logoff request is out.
/// - **AuthKnown**: the remote authority confirmed the identity.
/// - **AuthChanging**: a confirmed identity differs from the previous one;
///   observers are being told before the session settles in `AuthKnown`.
/// - **AuthError**: the last request failed; see the snapshot's last error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    #[default]
    Start,
    AuthUnknown,
    Authenticating,
    AuthKnown,
    AuthChanging,
    AuthError,
}

impl AuthStatus {
    /// Every status, in declaration order.
    pub const ALL: [AuthStatus; 6] = [
        Self::Start,
        Self::AuthUnknown,
        Self::Authenticating,
        Self::AuthKnown,
        Self::AuthChanging,
        Self::AuthError,
    ];

    /// Returns `true` while an answer from the remote authority is awaited
    /// for a probe or a logon/logoff request.
    pub fn is_awaiting_answer(self) -> bool {
        matches!(self, Self::AuthUnknown | Self::Authenticating)
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::AuthUnknown => "auth_unknown",
            Self::Authenticating => "authenticating",
            Self::AuthKnown => "auth_known",
            Self::AuthChanging => "auth_changing",
            Self::AuthError => "auth_error",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde_name() {
        for status in AuthStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.to_string());
        }
    }

    #[test]
    fn test_default_is_start() {
        assert_eq!(AuthStatus::default(), AuthStatus::Start);
    }

    #[test]
    fn test_is_awaiting_answer() {
        assert!(AuthStatus::AuthUnknown.is_awaiting_answer());
        assert!(AuthStatus::Authenticating.is_awaiting_answer());
        assert!(!AuthStatus::Start.is_awaiting_answer());
        assert!(!AuthStatus::AuthKnown.is_awaiting_answer());
        assert!(!AuthStatus::AuthChanging.is_awaiting_answer());
        assert!(!AuthStatus::AuthError.is_awaiting_answer());
    }
}
