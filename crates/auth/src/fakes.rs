//! Recording fakes for the transport and source-credential traits.

use async_trait::async_trait;
use downscope_types::{
    BearerToken, CredentialError, HttpRequest, HttpResponse, HttpTransport, SourceCredential,
    TransportError,
};
use http::StatusCode;
use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: Result<HttpResponse, TransportError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_json(&self, status: u16, body: &serde_json::Value) {
        let status = StatusCode::from_u16(status).unwrap();
        self.push(Ok(HttpResponse::new(status, body.to_string())));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("no response queued".into())))
    }
}

/// Counters shared between a fake credential and its scoped copies.
#[derive(Debug, Default)]
pub struct CredentialCalls {
    pub refreshes: AtomicUsize,
    pub scope_requests: Mutex<Vec<Vec<String>>>,
}

#[derive(Debug)]
pub struct FakeCredential {
    identity: String,
    token: BearerToken,
    needs_scopes: bool,
    fail_refresh: bool,
    pub calls: Arc<CredentialCalls>,
}

impl FakeCredential {
    pub fn new(identity: &str, token: &str) -> Self {
        Self {
            identity: identity.to_string(),
            token: BearerToken::expiring_in(token, 3600),
            needs_scopes: false,
            fail_refresh: false,
            calls: Arc::default(),
        }
    }

    #[must_use]
    pub fn needing_scopes(mut self) -> Self {
        self.needs_scopes = true;
        self
    }

    #[must_use]
    pub fn failing_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    pub fn refreshes(&self) -> usize {
        self.calls.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceCredential for FakeCredential {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn needs_scope_elevation(&self) -> bool {
        self.needs_scopes
    }

    fn with_scopes(&self, scopes: &[&str]) -> Arc<dyn SourceCredential> {
        self.calls
            .scope_requests
            .lock()
            .unwrap()
            .push(scopes.iter().map(ToString::to_string).collect());
        Arc::new(Self {
            identity: self.identity.clone(),
            token: self.token.clone(),
            needs_scopes: false,
            fail_refresh: self.fail_refresh,
            calls: Arc::clone(&self.calls),
        })
    }

    async fn refresh_if_expired(&self) -> Result<(), CredentialError> {
        self.calls.refreshes.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh {
            return Err(CredentialError::Refresh("invalid_grant".into()));
        }
        Ok(())
    }

    fn current_token(&self) -> Result<BearerToken, CredentialError> {
        Ok(self.token.clone())
    }
}
