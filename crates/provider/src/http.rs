//! Production transport backed by `reqwest`.

use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Method, RequestBody};
use async_trait::async_trait;
use ruleswitch_core::error::{RuleSwitchError, RuleSwitchResult};
use std::time::Duration;

/// Sends requests over HTTPS with a shared connection pool.
///
/// ```ignore
/// let transport = ReqwestTransport::new(Duration::from_secs(30))?;
/// ```
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> RuleSwitchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ruleswitch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RuleSwitchError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> RuleSwitchResult<HttpResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
        };

        tracing::debug!(method = %method, url = %request.url, "sending request");

        let mut builder = self.client.request(method, request.url.clone());
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(pairs) => builder.form(pairs),
            RequestBody::Json(value) => builder.json(value),
        };

        let resp = builder
            .send()
            .await
            .map_err(|e| RuleSwitchError::Transport(format!("{}: {e}", request.url)))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| RuleSwitchError::Transport(format!("reading body: {e}")))?;

        tracing::debug!(status, bytes = body.len(), "received response");
        Ok(HttpResponse { status, body })
    }
}
