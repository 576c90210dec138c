//! Source credential wrapping an access token minted elsewhere.
//!
//! Useful for token brokers that receive a root token from a caller, and for
//! `gcloud auth print-access-token` style workflows. The token cannot be
//! renewed, so once it expires every exchange fails until a new one is
//! supplied.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use downscope_types::{BearerToken, CredentialError, SourceCredential};
use std::sync::Arc;

/// Lifetime assumed for a root token given without an expiry.
pub const DEFAULT_ROOT_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct StaticTokenCredential {
    identity: String,
    token: BearerToken,
}

impl StaticTokenCredential {
    /// Wrap `token` under the identity label `identity`.
    pub fn new(identity: impl Into<String>, token: BearerToken) -> Self {
        Self {
            identity: identity.into(),
            token,
        }
    }

    /// Wrap a raw access token; without `expiry` it is assumed to be valid for
    /// [`DEFAULT_ROOT_LIFETIME_SECS`].
    pub fn from_access_token(
        identity: impl Into<String>,
        access_token: impl Into<String>,
        expiry: Option<DateTime<Utc>>,
    ) -> Self {
        let token = match expiry {
            Some(at) => BearerToken::new(access_token, at),
            None => BearerToken::expiring_in(access_token, DEFAULT_ROOT_LIFETIME_SECS),
        };
        Self::new(identity, token)
    }
}

#[async_trait]
impl SourceCredential for StaticTokenCredential {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn needs_scope_elevation(&self) -> bool {
        false
    }

    /// Scopes are fixed when the token was minted; the copy is unchanged.
    fn with_scopes(&self, _scopes: &[&str]) -> Arc<dyn SourceCredential> {
        Arc::new(self.clone())
    }

    async fn refresh_if_expired(&self) -> Result<(), CredentialError> {
        if self.token.is_expired() {
            return Err(CredentialError::Expired);
        }
        Ok(())
    }

    fn current_token(&self) -> Result<BearerToken, CredentialError> {
        if self.token.value().is_empty() {
            return Err(CredentialError::NoToken);
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_valid_token_refresh_ok() {
        let cred = StaticTokenCredential::from_access_token("cli", "ya29.root", None);
        assert!(cred.refresh_if_expired().await.is_ok());
        assert_eq!(cred.current_token().unwrap().value(), "ya29.root");
        assert!(!cred.needs_scope_elevation());
    }

    #[tokio::test]
    async fn test_expired_token_refresh_fails() {
        let cred = StaticTokenCredential::from_access_token(
            "cli",
            "ya29.old",
            Some(Utc::now() - Duration::seconds(5)),
        );
        let err = cred.refresh_if_expired().await.unwrap_err();
        assert!(matches!(err, CredentialError::Expired));
    }

    #[test]
    fn test_empty_token_has_no_token() {
        let cred = StaticTokenCredential::from_access_token("cli", "", None);
        assert!(matches!(
            cred.current_token().unwrap_err(),
            CredentialError::NoToken
        ));
    }

    #[test]
    fn test_with_scopes_keeps_identity() {
        let cred = StaticTokenCredential::from_access_token("broker", "tok", None);
        let scoped = cred.with_scopes(&["https://www.googleapis.com/auth/cloud-platform"]);
        assert_eq!(scoped.identity(), "broker");
    }
}
