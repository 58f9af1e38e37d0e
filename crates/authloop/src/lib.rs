//! # authloop
//!
//! Keeps one client context's view of "who is logged in" in sync with the
//! remote authority and with sibling contexts.
//!
//! An [`AuthWorker`](AuthWorkerBuilder) owns the session state machine
//! from `authloop-session` and wires it to three collaborators:
//!
//! - an [`AuthEndpoint`] it sends `status`/`refresh`/`logon`/`logoff` to,
//! - a [`MessageBus`] it listens on for logon/logoff requests and
//!   publishes auth changes to,
//! - an [`IdentityStore`] that remembers the last resolved user id.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use authloop::prelude::*;
//!
//! # async fn run() -> Result<(), AuthloopError> {
//! let endpoint = HttpEndpoint::new(HttpEndpointConfig::new("https://example.com/zotonic-auth"))?;
//! let bus = Arc::new(LocalBus::default());
//! let mut auth_events = bus.subscribe(topics::AUTH);
//!
//! let auth = AuthWorkerBuilder::new().spawn(endpoint, Arc::clone(&bus), MemoryStore::default());
//! auth.start().await?;
//!
//! while let Some(event) = auth_events.recv().await {
//!     let info: AuthInfo = event.decode()?;
//!     println!("user: {:?}", info.user_id);
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod inbound;
mod worker;

pub use config::WorkerConfig;
pub use error::AuthloopError;
pub use worker::{AuthHandle, AuthWorkerBuilder};

pub use authloop_protocol as protocol;
pub use authloop_session as session;
pub use authloop_transport as transport;

pub use authloop_transport::{AuthEndpoint, IdentityStore, MessageBus};

pub mod prelude {
    pub use crate::{AuthHandle, AuthWorkerBuilder, AuthloopError, WorkerConfig};

    pub use authloop_protocol::{
        AuthInfo, AuthOutcome, AuthRequest, AuthResponse, BusMessage, Command, Credentials,
        LogoffRequest, LogonForm, LogonRequest, UserId, topics,
    };
    pub use authloop_session::{Action, AuthFailure, AuthStatus, FailureKind, SessionSnapshot};
    pub use authloop_transport::{
        AuthEndpoint, FileStore, HttpEndpoint, HttpEndpointConfig, IdentityStore, LocalBus,
        MemoryStore, MessageBus, Subscription, TransportError,
    };
}
