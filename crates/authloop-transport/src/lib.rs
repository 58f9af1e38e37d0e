//! Collaborator seams for authloop.
//!
//! The auth worker talks to three things it does not own:
//!
//! - the **remote authority** ([`AuthEndpoint`], [`HttpEndpoint`]),
//! - the **message bus** ([`MessageBus`], [`LocalBus`]),
//! - the **persistent identity store** ([`IdentityStore`], [`MemoryStore`],
//!   [`FileStore`]).
//!
//! Each is a trait so hosts can plug in their own implementation, and
//! each ships a default one so the worker runs out of the box.
//!
//! # Feature Flags
//!
//! - `http` (default): [`HttpEndpoint`] via `reqwest`

#![allow(async_fn_in_trait)]

mod bus;
mod error;
#[cfg(feature = "http")]
mod http;
mod store;

pub use bus::{LocalBus, MessageBus, Subscription};
pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::{HttpEndpoint, HttpEndpointConfig};
pub use store::{FileStore, IdentityStore, MemoryStore};

use authloop_protocol::{AuthRequest, AuthResponse};

/// Sends one command to the remote authority and returns its answer.
///
/// # Trait bounds
///
/// - `Send + Sync` → the worker shares the endpoint with every spawned
///   request task.
/// - `'static` → the endpoint lives as long as the worker.
///
/// # Example
///
/// ```rust
/// use authloop_protocol::{AuthRequest, AuthResponse, UserId};
/// use authloop_transport::{AuthEndpoint, TransportError};
///
/// /// Claims everybody is user 1. Only useful in tests.
/// struct AlwaysUserOne;
///
/// impl AuthEndpoint for AlwaysUserOne {
///     async fn call(
///         &self,
///         _request: &AuthRequest,
///     ) -> Result<AuthResponse, TransportError> {
///         Ok(AuthResponse::ok(Some(UserId(1))))
///     }
/// }
/// ```
pub trait AuthEndpoint: Send + Sync + 'static {
    /// Performs the request.
    ///
    /// # Returns
    /// - `Ok(AuthResponse)`: the server answered, with any `status`
    ///   (an `error` status is still an answer)
    /// - `Err(TransportError)`: no usable answer (network down, timeout,
    ///   non-JSON body)
    fn call(
        &self,
        request: &AuthRequest,
    ) -> impl std::future::Future<Output = Result<AuthResponse, TransportError>> + Send;
}
