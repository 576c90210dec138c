//! [`HttpTransport`] backed by a shared `reqwest` client.

use async_trait::async_trait;
use downscope_types::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use reqwest::Client;
use std::time::Duration;

/// Production transport. Cloning is cheap and shares the connection pool.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Build a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(http))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.http.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok(HttpResponse::new(status, body))
    }
}
