//! HTTP implementation of [`AuthEndpoint`] using `reqwest`.

use std::time::Duration;

use authloop_protocol::{AuthOutcome, AuthRequest, AuthResponse, Codec, JsonCodec};
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};

use crate::{AuthEndpoint, TransportError};

/// Where and how to reach the remote authority.
#[derive(Debug, Clone)]
pub struct HttpEndpointConfig {
    /// Absolute URL of the auth endpoint, e.g. `https://example.com/zotonic-auth`.
    pub url: String,
    /// Upper bound for a whole request. A request that times out is
    /// reported as [`TransportError::Unreachable`], so the session never
    /// waits forever on an answer.
    pub timeout: Duration,
}

impl HttpEndpointConfig {
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Config for `url` with the default timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Load from `AUTHLOOP_ENDPOINT_URL` and the optional
    /// `AUTHLOOP_TIMEOUT_SECS`. Returns `None` if the URL is missing.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("AUTHLOOP_ENDPOINT_URL").ok()?;
        let timeout = std::env::var("AUTHLOOP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(Self::DEFAULT_TIMEOUT, Duration::from_secs);
        Some(Self { url, timeout })
    }
}

/// Posts JSON commands to the remote authority.
///
/// The client keeps a cookie store so the session cookie set by a `logon`
/// answer is sent with every later `status`/`refresh` probe, like a
/// browser would.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    client: reqwest::Client,
    config: HttpEndpointConfig,
    codec: JsonCodec,
}

impl HttpEndpoint {
    /// Builds the HTTP client.
    ///
    /// # Errors
    /// Returns [`TransportError::Setup`] if the TLS backend can't be
    /// initialized.
    pub fn new(config: HttpEndpointConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;
        tracing::debug!(url = %config.url, timeout = ?config.timeout, "auth endpoint ready");
        Ok(Self {
            client,
            config,
            codec: JsonCodec,
        })
    }

    /// The configured endpoint URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }
}

impl AuthEndpoint for HttpEndpoint {
    async fn call(
        &self,
        request: &AuthRequest,
    ) -> Result<AuthResponse, TransportError> {
        let body = self.codec.encode(request)?;

        let resp = self
            .client
            .post(&self.config.url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        // A non-2xx reply still counts as an answer when its body is an
        // explicit error, so the server's reason reaches the session.
        if !status.is_success() {
            return match self.codec.decode::<AuthResponse>(&bytes) {
                Ok(reply) if reply.status == AuthOutcome::Error => {
                    tracing::debug!(
                        http_status = status.as_u16(),
                        error = ?reply.error,
                        "auth endpoint rejected request"
                    );
                    Ok(reply)
                }
                _ => Err(TransportError::Status(status.as_u16())),
            };
        }

        let reply: AuthResponse = self.codec.decode(&bytes)?;
        tracing::trace!(command = %request.command(), status = ?reply.status, "auth endpoint answered");
        Ok(reply)
    }
}
