//! Authentication session state machine for authloop.
//!
//! This crate is the pure core: no I/O, no tasks, no clocks. It holds
//! one context's view of who the user is and decides, for every incoming
//! event, what to ask the remote authority and what to tell everyone else.
//!
//! 1. **Actions** ([`Action`]): what happened, turned into a sparse
//!    [`Proposal`]
//! 2. **Model** ([`present`]): folds the proposal into the
//!    [`SessionSnapshot`] and returns [`Effect`]s
//! 3. **Transitions** ([`state_change`]): status changes plus the
//!    broadcasts tied to them
//!
//! # How it fits in the stack
//!
//! ```text
//! Worker (above)  ← owns the snapshot, runs effects, feeds completions back
//!     ↕
//! Session Layer (this crate)  ← decides what happens next
//!     ↕
//! Protocol Layer (below)  ← provides AuthInfo, AuthRequest, bus payloads
//! ```
//!
//! # Example
//!
//! ```
//! use authloop_session::{dispatch, Action, AuthStatus, Effect, ModelConfig, SessionSnapshot};
//! use authloop_protocol::AuthRequest;
//!
//! let mut snapshot = SessionSnapshot::new();
//! let effects = dispatch(&mut snapshot, Action::Start { remembered: None }, &ModelConfig::default());
//!
//! assert_eq!(snapshot.status(), AuthStatus::AuthUnknown);
//! assert!(effects.contains(&Effect::Request(AuthRequest::Status)));
//! ```

mod action;
mod effect;
mod model;
mod predicates;
mod snapshot;
mod status;

pub use action::{Action, AuthFailure, FailureKind, Proposal};
pub use effect::{Effect, Publication};
pub use model::{ModelConfig, dispatch, next_action, present, render, state_change};
pub use snapshot::SessionSnapshot;
pub use status::AuthStatus;
