//! Downscoped credentials: a [`TokenSource`] that mints bounded tokens from a
//! broader root credential.
//!
//! Every call refreshes the root credential if needed and performs a fresh
//! exchange. Nothing is cached here; wrap the source in a caching layer if
//! tokens should be reused until expiry.

use crate::exchange::{ExchangeConfig, TokenExchangeClient};
use async_trait::async_trait;
use downscope_types::{
    BearerToken, DownscopeError, DownscopedOptions, HttpTransport, SourceCredential, TokenSource,
    traits::Result,
};
use std::{fmt, sync::Arc};

/// Scope requested for root credentials that cannot be used unscoped.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

#[derive(Clone)]
pub struct DownscopedCredentialSource {
    source: Arc<dyn SourceCredential>,
    options: DownscopedOptions,
    client: TokenExchangeClient,
}

impl DownscopedCredentialSource {
    /// Bind `source` to the access boundary in `options`.
    ///
    /// A source that cannot be used unscoped is replaced by its
    /// cloud-platform scoped copy here, once.
    ///
    /// # Errors
    ///
    /// Returns [`DownscopeError::InvalidPolicy`] if `options` is invalid.
    pub fn new(
        source: Arc<dyn SourceCredential>,
        options: DownscopedOptions,
        client: TokenExchangeClient,
    ) -> Result<Self> {
        options.validate()?;
        let source = if source.needs_scope_elevation() {
            source.with_scopes(&[CLOUD_PLATFORM_SCOPE])
        } else {
            source
        };
        Ok(Self {
            source,
            options,
            client,
        })
    }

    /// Convenience constructor building the exchange client from a transport.
    ///
    /// # Errors
    ///
    /// Returns [`DownscopeError::InvalidPolicy`] if `options` is invalid.
    pub fn with_transport(
        source: Arc<dyn SourceCredential>,
        options: DownscopedOptions,
        transport: Arc<dyn HttpTransport>,
        config: ExchangeConfig,
    ) -> Result<Self> {
        Self::new(source, options, TokenExchangeClient::new(transport, config))
    }

    /// Refresh the root credential if needed and exchange its token for a
    /// downscoped one.
    ///
    /// # Errors
    ///
    /// Returns [`DownscopeError::RootCredentialRefresh`] if the root credential
    /// cannot be refreshed (no exchange is attempted), or any error from
    /// [`TokenExchangeClient::exchange`].
    pub async fn get_token(&self) -> Result<BearerToken> {
        let source = &self.source;
        source
            .refresh_if_expired()
            .await
            .map_err(DownscopeError::RootCredentialRefresh)?;
        let root = source
            .current_token()
            .map_err(DownscopeError::RootCredentialRefresh)?;

        let token = self.client.exchange(&root, &self.options).await?;
        tracing::info!(
            source = source.identity(),
            expires_in = token.expires_in().num_seconds(),
            "minted downscoped token"
        );
        Ok(token)
    }
}

#[async_trait]
impl TokenSource for DownscopedCredentialSource {
    async fn token(&self) -> Result<BearerToken> {
        self.get_token().await
    }
}

/// Equal when bound to the same root identity and the same boundary; the
/// transport is not part of identity.
impl PartialEq for DownscopedCredentialSource {
    fn eq(&self, other: &Self) -> bool {
        self.source.identity() == other.source.identity() && self.options == other.options
    }
}

impl Eq for DownscopedCredentialSource {}

impl fmt::Debug for DownscopedCredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownscopedCredentialSource")
            .field("source", &self.source.identity())
            .field("options", &self.options)
            .field("client", &self.client)
            .finish()
    }
}
