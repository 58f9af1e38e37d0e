//! The session snapshot: the single source of truth for one context.

use authloop_protocol::AuthInfo;
use serde_json::Value;

use crate::action::AuthFailure;
use crate::status::AuthStatus;

/// Everything the session knows right now.
///
/// Fields are only written by [`present`](crate::present) and
/// [`state_change`](crate::state_change); everyone else reads through the
/// accessors. A fresh snapshot is in [`AuthStatus::Start`] with a pending,
/// anonymous [`AuthInfo`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub(crate) status: AuthStatus,
    pub(crate) pending_keep_alive: bool,
    pub(crate) last_error: Option<AuthFailure>,
    pub(crate) auth: AuthInfo,
    pub(crate) onauth: Option<Value>,
    pub(crate) checks_in_flight: u32,
}

impl SessionSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> AuthStatus {
        self.status
    }

    /// The remote authority's last successful answer.
    pub fn auth(&self) -> &AuthInfo {
        &self.auth
    }

    /// A keep-alive arrived and will turn the next periodic check into a
    /// `refresh`.
    pub fn pending_keep_alive(&self) -> bool {
        self.pending_keep_alive
    }

    /// Why the session last went to `auth_error`. Cleared by the next
    /// logon or logoff request.
    pub fn last_error(&self) -> Option<&AuthFailure> {
        self.last_error.as_ref()
    }

    /// Correlation token of the most recent logon/logoff request.
    pub fn onauth(&self) -> Option<&Value> {
        self.onauth.as_ref()
    }

    /// `status`/`refresh` probes issued and not yet answered.
    pub fn checks_in_flight(&self) -> u32 {
        self.checks_in_flight
    }
}
