//! Wire and bus vocabulary for authloop.
//!
//! This crate defines the "language" spoken between the auth worker and
//! its collaborators:
//!
//! - **Auth types** ([`AuthRequest`], [`AuthResponse`], [`AuthInfo`]) -
//!   what goes to and comes back from the remote authority.
//! - **Bus payloads** ([`topics`], [`LogonRequest`], [`AuthChanging`], ...) -
//!   what the worker publishes and subscribes to on the message bus.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how values become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer knows nothing about HTTP, channels, or state
//! machines. It only describes shapes and how to (de)serialize them.
//!
//! ```text
//! Transport (HTTP, bus, store) → Protocol (typed payloads) → Session (state machine)
//! ```

mod bus;
mod codec;
mod error;
mod types;

pub use bus::{
    topics, ActivityEvent, AuthChanging, BusMessage, LogoffRequest,
    LogonForm, LogonRequest,
};
pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    AuthInfo, AuthOutcome, AuthRequest, AuthResponse, Command, Credentials,
    Preferences, UserId,
};
