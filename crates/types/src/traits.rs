//! Async traits shared across the downscope crates.
//!
//! The exchange client depends only on these capabilities, never on a concrete
//! HTTP client or credential implementation.

use crate::{BearerToken, CredentialError, DownscopeError, HttpRequest, HttpResponse, TransportError};
use async_trait::async_trait;
use std::{fmt, sync::Arc};

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DownscopeError>;

/// Issues HTTP requests on behalf of the exchange client.
///
/// Timeouts, proxies and TLS are properties of the implementation.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request` and return whatever the server answered, including
    /// non-2xx statuses.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] only when no response was received.
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError>;
}

/// The root credential a downscoped token is minted from.
///
/// Implementations own and synchronize their token state.
#[async_trait]
pub trait SourceCredential: Send + Sync + fmt::Debug {
    /// Stable identity of the credential (account, client id, label).
    fn identity(&self) -> &str;

    /// Whether the credential must be given explicit scopes before use.
    fn needs_scope_elevation(&self) -> bool;

    /// A copy of this credential requesting `scopes`.
    fn with_scopes(&self, scopes: &[&str]) -> Arc<dyn SourceCredential>;

    /// Refresh the token if it is missing or expired.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] if the refresh fails.
    async fn refresh_if_expired(&self) -> std::result::Result<(), CredentialError>;

    /// The token currently held.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::NoToken`] if no token has been obtained.
    fn current_token(&self) -> std::result::Result<BearerToken, CredentialError>;
}

/// Anything that can hand out bearer tokens on demand.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Obtain a usable token.
    async fn token(&self) -> Result<BearerToken>;
}
