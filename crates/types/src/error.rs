//! Error types for the downscope workspace.

use thiserror::Error;

/// A failure to reach an endpoint at all (DNS, connect, TLS, timeout).
#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self(e.to_string())
    }
}

/// Failures reported by a source (root) credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The token is past its expiry and the credential cannot renew it.
    #[error("source token expired and cannot be refreshed")]
    Expired,

    /// The credential's own refresh call was rejected.
    #[error("source credential refresh failed: {0}")]
    Refresh(String),

    /// The credential holds no token yet.
    #[error("source credential has no access token")]
    NoToken,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Enumerates every way minting a downscoped token can fail.
#[derive(Debug, Error)]
pub enum DownscopeError {
    /// The access boundary failed local validation and was never sent.
    #[error("invalid access boundary: {0}")]
    InvalidPolicy(String),

    /// The root credential could not be refreshed.
    #[error("unable to refresh source credential: {0}")]
    RootCredentialRefresh(#[source] CredentialError),

    /// The exchange endpoint could not be reached.
    #[error("error requesting downscoped token from {endpoint}: {source}")]
    ExchangeRequest {
        endpoint: String,
        #[source]
        source: TransportError,
    },

    /// The exchange endpoint answered with a non-200 status.
    #[error("token exchange at {endpoint} failed: status={status}, body={body}")]
    ExchangeServer {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The exchange endpoint answered 200 without the required fields.
    #[error("malformed token exchange response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    /// The fallback expiry lookup failed or was malformed.
    #[error("unable to determine root token expiry from {endpoint}: {reason}")]
    ExpiryLookup { endpoint: String, reason: String },

    /// The outgoing form body or query string could not be URL-encoded.
    #[error("cannot encode request: {0}")]
    RequestEncoding(String),

    /// JSON serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DownscopeError {
    /// Returns `true` if the error is likely transient and worth retrying.
    ///
    /// Nothing in this workspace retries; the classification is for callers.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ExchangeServer { status, .. } => {
                matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
            }
            Self::ExchangeRequest { .. } => true,
            Self::RootCredentialRefresh(CredentialError::Transport(_)) => true,
            _ => false,
        }
    }
}
