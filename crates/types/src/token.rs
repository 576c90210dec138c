//! Bearer token representation and expiry logic.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An access token with an absolute UTC expiry.
///
/// Used for both the root token and the downscoped token minted from it.
/// Immutable once constructed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerToken {
    #[serde(rename = "access_token")]
    value: String,
    expiry: DateTime<Utc>,
}

impl BearerToken {
    pub fn new(value: impl Into<String>, expiry: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expiry,
        }
    }

    /// Create a token expiring `expires_in_secs` seconds from now.
    ///
    /// Lifetimes beyond what a timestamp can hold saturate at the
    /// representable bounds; use [`BearerToken::try_expiring_in`] for
    /// untrusted input.
    pub fn expiring_in(value: impl Into<String>, expires_in_secs: i64) -> Self {
        let expiry = expiry_after(expires_in_secs).unwrap_or(if expires_in_secs < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });
        Self::new(value, expiry)
    }

    /// Like [`BearerToken::expiring_in`], but `None` when `now + expires_in_secs`
    /// is not representable.
    pub fn try_expiring_in(value: impl Into<String>, expires_in_secs: i64) -> Option<Self> {
        expiry_after(expires_in_secs).map(|expiry| Self::new(value, expiry))
    }

    /// The raw token string, suitable for an `Authorization: Bearer` header.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    /// Remaining lifetime; zero once the token has expired.
    #[must_use]
    pub fn expires_in(&self) -> Duration {
        (self.expiry - Utc::now()).max(Duration::zero())
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expiry
    }

    /// Return `true` if the token expires within `window` from now.
    #[must_use]
    pub fn is_expiring_within(&self, window: Duration) -> bool {
        Utc::now() + window >= self.expiry
    }
}

fn expiry_after(secs: i64) -> Option<DateTime<Utc>> {
    Utc::now().checked_add_signed(Duration::try_seconds(secs)?)
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("value", &"[redacted]")
            .field("expiry", &self.expiry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_token_not_expired() {
        let t = BearerToken::expiring_in("tok", 3600);
        assert!(!t.is_expired());
        assert!(t.expires_in() > Duration::seconds(3590));
    }

    #[test]
    fn test_past_expiry_is_expired() {
        let t = BearerToken::new("old", Utc::now() - Duration::seconds(100));
        assert!(t.is_expired());
        assert_eq!(t.expires_in(), Duration::zero());
    }

    #[test]
    fn test_expiring_within_window() {
        let t = BearerToken::expiring_in("tok", 30);
        assert!(t.is_expiring_within(Duration::seconds(60)));
        assert!(!t.is_expiring_within(Duration::seconds(5)));
    }

    #[test]
    fn test_try_expiring_in_out_of_range() {
        assert!(BearerToken::try_expiring_in("tok", i64::MAX).is_none());
        assert!(BearerToken::try_expiring_in("tok", 99_999_999_999_999_999).is_none());
        let t = BearerToken::try_expiring_in("tok", 1800).unwrap();
        assert!(t.expires_in() > Duration::seconds(1790));
    }

    #[test]
    fn test_expiring_in_saturates() {
        let t = BearerToken::expiring_in("tok", i64::MAX);
        assert_eq!(t.expiry(), DateTime::<Utc>::MAX_UTC);
        assert!(BearerToken::expiring_in("tok", i64::MIN).is_expired());
    }

    #[test]
    fn test_debug_redacts_value() {
        let t = BearerToken::expiring_in("ya29.secret-value", 60);
        let dbg = format!("{t:?}");
        assert!(!dbg.contains("secret-value"));
        assert!(dbg.contains("redacted"));
    }

    #[test]
    fn test_serialized_shape() {
        let t = BearerToken::expiring_in("tok", 60);
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["access_token"], "tok");
        assert!(v["expiry"].is_string());
        let back: BearerToken = serde_json::from_value(v).unwrap();
        assert_eq!(back, t);
    }
}
