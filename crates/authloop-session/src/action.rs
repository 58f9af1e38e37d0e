//! Actions and the proposals they turn into.
//!
//! An [`Action`] is what happened: a user pressed "log on", the server
//! answered, the check timer fired. [`Action::into_proposal`] flattens it
//! into a sparse [`Proposal`] that the model folds into the snapshot.

use std::fmt;

use authloop_protocol::{
    AuthInfo, AuthOutcome, AuthResponse, Command, Credentials, LogoffRequest, LogonForm,
    LogonRequest, UserId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

/// Where a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The request never got a usable answer: network down, timeout,
    /// non-2xx status, unparsable body.
    Transport,
    /// The remote authority answered `{"status": "error"}`.
    Rejected,
}

/// A failed request, as recorded on the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFailure {
    pub kind: FailureKind,
    /// Failure text, or the server's reason (e.g. `"pw"`).
    pub detail: Option<String>,
}

impl AuthFailure {
    pub fn transport(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            detail: Some(detail.into()),
        }
    }

    pub fn rejected(reason: Option<String>) -> Self {
        Self {
            kind: FailureKind::Rejected,
            detail: reason,
        }
    }

    pub fn is_transport(&self) -> bool {
        self.kind == FailureKind::Transport
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            FailureKind::Transport => "transport failure",
            FailureKind::Rejected => "rejected",
        };
        match &self.detail {
            Some(detail) => write!(f, "{kind}: {detail}"),
            None => f.write_str(kind),
        }
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// One external request or event.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Boot the session. `remembered` is what the identity store held.
    Start { remembered: Option<UserId> },
    /// The stored identity changed under us (another context wrote it).
    SetUserId(Option<UserId>),
    /// A sibling context resolved an identity and broadcast it.
    Sync(AuthInfo),
    /// The remote authority answered a request.
    AuthResponse {
        command: Command,
        response: AuthResponse,
    },
    /// A request failed before an answer could be read.
    AuthError {
        command: Command,
        failure: AuthFailure,
    },
    /// The settle delay after entering `auth_changing` elapsed.
    AuthChanged,
    /// The periodic check timer fired.
    AuthCheck,
    Logon(LogonRequest),
    LogonForm(LogonForm),
    Logoff(LogoffRequest),
    /// The user did something; refresh the server session on the next check.
    KeepAlive,
}

impl Action {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::SetUserId(_) => "set_user_id",
            Self::Sync(_) => "sync",
            Self::AuthResponse { .. } => "auth_response",
            Self::AuthError { .. } => "auth_error",
            Self::AuthChanged => "auth_changed",
            Self::AuthCheck => "auth_check",
            Self::Logon(_) => "logon",
            Self::LogonForm(_) => "logon_form",
            Self::Logoff(_) => "logoff",
            Self::KeepAlive => "keep_alive",
        }
    }

    /// Flatten into the sparse record the model consumes.
    ///
    /// A reply with `status: error` becomes a rejected failure, a `pending`
    /// reply only reports that the request completed.
    pub fn into_proposal(self) -> Proposal {
        match self {
            Self::Start { remembered } => Proposal {
                remembered_user_id: Some(remembered),
                ..Proposal::default()
            },
            Self::SetUserId(user_id) => Proposal {
                user_id: Some(user_id),
                ..Proposal::default()
            },
            Self::Sync(auth) => Proposal {
                user_id: Some(auth.user_id),
                ..Proposal::default()
            },
            Self::AuthResponse { command, response } => {
                let mut proposal = Proposal {
                    completed: Some(command),
                    ..Proposal::default()
                };
                match response.status {
                    AuthOutcome::Ok => proposal.auth_response = Some(response),
                    AuthOutcome::Error => {
                        proposal.is_auth_error = true;
                        proposal.error = Some(AuthFailure::rejected(response.error));
                    }
                    AuthOutcome::Pending => {}
                }
                proposal
            }
            Self::AuthError { command, failure } => Proposal {
                completed: Some(command),
                is_auth_error: true,
                error: Some(failure),
                ..Proposal::default()
            },
            Self::AuthChanged => Proposal {
                is_auth_changed: true,
                ..Proposal::default()
            },
            Self::AuthCheck => Proposal {
                is_auth_check: true,
                ..Proposal::default()
            },
            Self::Logon(request) | Self::LogonForm(LogonForm { value: request }) => Proposal {
                logon: Some(request.credentials),
                onauth: request.onauth,
                ..Proposal::default()
            },
            Self::Logoff(request) => Proposal {
                logoff: true,
                onauth: request.onauth,
                ..Proposal::default()
            },
            Self::KeepAlive => Proposal {
                is_keep_alive: true,
                ..Proposal::default()
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Proposal
// ---------------------------------------------------------------------------

/// A sparse event payload. Unset fields mean "not part of this event".
///
/// The double `Option`s distinguish "no identity in this event" (`None`)
/// from "the identity is anonymous" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Proposal {
    pub remembered_user_id: Option<Option<UserId>>,
    pub user_id: Option<Option<UserId>>,
    /// A successful answer.
    pub auth_response: Option<AuthResponse>,
    /// Which request this event completes, if any.
    pub completed: Option<Command>,
    pub is_auth_check: bool,
    pub is_auth_error: bool,
    pub error: Option<AuthFailure>,
    pub is_auth_changed: bool,
    pub is_keep_alive: bool,
    pub logon: Option<Credentials>,
    pub logoff: bool,
    pub onauth: Option<Value>,
}
