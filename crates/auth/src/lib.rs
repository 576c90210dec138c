//! Downscoped credential minting.
//!
//! [`TokenExchangeClient`] performs the STS token exchange for a root token
//! and an access boundary. [`DownscopedCredentialSource`] composes it with a
//! refreshable root credential behind the [`TokenSource`] trait.
//!
//! [`TokenSource`]: downscope_types::TokenSource

pub mod credentials;
pub mod downscoped;
pub mod exchange;
pub mod transport;

#[cfg(test)]
mod fakes;

pub use credentials::StaticTokenCredential;
pub use downscoped::{CLOUD_PLATFORM_SCOPE, DownscopedCredentialSource};
pub use exchange::{ExchangeConfig, TokenExchangeClient};
pub use transport::ReqwestTransport;
