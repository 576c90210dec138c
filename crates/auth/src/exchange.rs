//! RFC 8693 token exchange against the security token service.
//!
//! One call to [`TokenExchangeClient::exchange`] POSTs the root token and the
//! serialized access boundary to the STS endpoint. When the STS omits
//! `expires_in` (root tokens derived from a user, 3LO, carry no fixed
//! lifetime) a second GET against the tokeninfo endpoint recovers the root
//! token's remaining lifetime, which the new token inherits.

use downscope_types::{
    BearerToken, DownscopeError, DownscopedOptions, HttpRequest, HttpTransport,
    traits::Result,
};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, sync::Arc};

/// Security token service token endpoint.
pub const STS_ENDPOINT: &str = "https://sts.googleapis.com/v1/token";

/// OAuth 2.0 tokeninfo endpoint used for the expiry fallback.
pub const TOKEN_INFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v3/tokeninfo";

pub const TOKEN_EXCHANGE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
pub const ACCESS_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:access_token";

/// Endpoints the exchange client talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub sts_endpoint: String,
    pub token_info_endpoint: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            sts_endpoint: STS_ENDPOINT.to_string(),
            token_info_endpoint: TOKEN_INFO_ENDPOINT.to_string(),
        }
    }
}

/// Parsed body of a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeResponse {
    pub access_token: String,
    pub expires_in: Option<i64>,
}

/// Build the form parameters for the token-exchange request.
#[must_use]
pub fn exchange_form_params<'a>(
    subject_token: &'a str,
    options_json: &'a str,
) -> [(&'static str, &'a str); 5] {
    [
        ("grant_type", TOKEN_EXCHANGE_GRANT_TYPE),
        ("subject_token_type", ACCESS_TOKEN_TYPE),
        ("requested_token_type", ACCESS_TOKEN_TYPE),
        ("subject_token", subject_token),
        ("options", options_json),
    ]
}

/// URL-encode a form body or query string.
fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_urlencoded::to_string(value).map_err(|e| DownscopeError::RequestEncoding(e.to_string()))
}

/// Read an `expires_in` value given either as a JSON number or a numeric string.
fn parse_expires_in(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse the STS JSON response.
///
/// # Errors
///
/// Returns [`DownscopeError::MalformedResponse`] if `access_token` is missing
/// or `expires_in` is present but not a positive integer.
pub fn parse_exchange_response(endpoint: &str, json: &Value) -> Result<ExchangeResponse> {
    let malformed = |reason: &str| DownscopeError::MalformedResponse {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    };

    let access_token = json
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed("missing access_token"))?
        .to_string();

    let expires_in = match json.get("expires_in") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let secs = parse_expires_in(v).ok_or_else(|| malformed("invalid expires_in"))?;
            if secs <= 0 {
                return Err(malformed("non-positive expires_in"));
            }
            Some(secs)
        }
    };

    Ok(ExchangeResponse {
        access_token,
        expires_in,
    })
}

/// Performs token exchanges over an injected [`HttpTransport`].
///
/// Holds no state between calls; concurrent exchanges are independent.
#[derive(Clone)]
pub struct TokenExchangeClient {
    transport: Arc<dyn HttpTransport>,
    config: ExchangeConfig,
}

impl TokenExchangeClient {
    pub fn new(transport: Arc<dyn HttpTransport>, config: ExchangeConfig) -> Self {
        Self { transport, config }
    }

    /// Exchange `root` for a token bounded by `options`.
    ///
    /// # Errors
    ///
    /// - [`DownscopeError::InvalidPolicy`] before any request if `options` is invalid.
    /// - [`DownscopeError::ExchangeRequest`] if the STS cannot be reached.
    /// - [`DownscopeError::ExchangeServer`] on a non-200 STS response.
    /// - [`DownscopeError::RequestEncoding`] if the form body cannot be encoded.
    /// - [`DownscopeError::MalformedResponse`] if the STS body lacks `access_token`
    ///   or carries an unusable `expires_in`.
    /// - [`DownscopeError::ExpiryLookup`] if the tokeninfo fallback fails.
    pub async fn exchange(
        &self,
        root: &BearerToken,
        options: &DownscopedOptions,
    ) -> Result<BearerToken> {
        let options_json = options.to_json()?;
        let endpoint = self.config.sts_endpoint.as_str();

        let form = encode(&exchange_form_params(root.value(), &options_json))?;

        tracing::debug!(
            endpoint,
            rules = options.access_boundary.access_boundary_rules.len(),
            "requesting downscoped token"
        );

        let resp = self
            .transport
            .send(HttpRequest::post_form(endpoint, form).with_header("Accept", "application/json"))
            .await
            .map_err(|source| DownscopeError::ExchangeRequest {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if resp.status != StatusCode::OK {
            tracing::warn!(endpoint, status = resp.status.as_u16(), "token exchange rejected");
            return Err(DownscopeError::ExchangeServer {
                endpoint: endpoint.to_string(),
                status: resp.status.as_u16(),
                body: resp.body,
            });
        }

        let json: Value = resp.json().map_err(|e| DownscopeError::MalformedResponse {
            endpoint: endpoint.to_string(),
            reason: format!("invalid JSON: {e}"),
        })?;
        let parsed = parse_exchange_response(endpoint, &json)?;

        match parsed.expires_in {
            Some(secs) => BearerToken::try_expiring_in(parsed.access_token, secs).ok_or_else(|| {
                DownscopeError::MalformedResponse {
                    endpoint: endpoint.to_string(),
                    reason: format!("expires_in out of range: {secs}"),
                }
            }),
            None => {
                let secs = self.lookup_root_expiry(root).await?;
                BearerToken::try_expiring_in(parsed.access_token, secs).ok_or_else(|| {
                    DownscopeError::ExpiryLookup {
                        endpoint: self.config.token_info_endpoint.clone(),
                        reason: format!("expires_in out of range: {secs}"),
                    }
                })
            }
        }
    }

    /// Ask the tokeninfo endpoint how long the root token has left.
    async fn lookup_root_expiry(&self, root: &BearerToken) -> Result<i64> {
        let endpoint = self.config.token_info_endpoint.as_str();
        let lookup_err = |reason: String| DownscopeError::ExpiryLookup {
            endpoint: endpoint.to_string(),
            reason,
        };

        tracing::debug!(endpoint, "exchange response has no expires_in, looking up root token expiry");

        let query = encode(&[("access_token", root.value())])?;
        let sep = if endpoint.contains('?') { '&' } else { '?' };
        let url = format!("{endpoint}{sep}{query}");

        let resp = self
            .transport
            .send(HttpRequest::get(url).with_header("Accept", "application/json"))
            .await
            .map_err(|e| lookup_err(e.to_string()))?;

        if resp.status != StatusCode::OK {
            tracing::warn!(endpoint, status = resp.status.as_u16(), "tokeninfo lookup rejected");
            return Err(lookup_err(format!(
                "status={}, body={}",
                resp.status.as_u16(),
                resp.body
            )));
        }

        let json: Value = resp
            .json()
            .map_err(|e| lookup_err(format!("invalid JSON: {e}")))?;
        let secs = json
            .get("expires_in")
            .and_then(parse_expires_in)
            .ok_or_else(|| lookup_err("missing expires_in".into()))?;
        if secs <= 0 {
            return Err(lookup_err(format!("non-positive expires_in: {secs}")));
        }
        Ok(secs)
    }
}

impl fmt::Debug for TokenExchangeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenExchangeClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
