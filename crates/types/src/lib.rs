//! Core types and traits for the downscope workspace.
//!
//! This crate defines the credential access boundary policy model, the bearer
//! token representation, the error taxonomy, and the collaborator traits
//! (HTTP transport, source credential) the exchange client is written against.

pub mod boundary;
pub mod error;
pub mod token;
pub mod traits;
pub mod wire;

pub use boundary::{AccessBoundary, AccessBoundaryRule, AvailabilityCondition, DownscopedOptions};
pub use error::{CredentialError, DownscopeError, TransportError};
pub use token::BearerToken;
pub use traits::{HttpTransport, SourceCredential, TokenSource};
pub use wire::{HttpRequest, HttpResponse};
