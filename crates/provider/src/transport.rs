//! Transport seam between the protocol code and the HTTP stack.
//!
//! Requests are plain data so the authorization flow and the Tooling API
//! client can be exercised offline against a recording transport.

use async_trait::async_trait;
use ruleswitch_core::error::{RuleSwitchError, RuleSwitchResult};
use serde::de::DeserializeOwned;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    /// `application/x-www-form-urlencoded` pairs, in order.
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
}

#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub bearer: Option<String>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            bearer: None,
            body: RequestBody::Empty,
        }
    }

    pub fn post_form(url: Url, form: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            url,
            bearer: None,
            body: RequestBody::Form(form),
        }
    }

    pub fn patch_json(url: Url, body: serde_json::Value) -> Self {
        Self {
            method: Method::Patch,
            url,
            bearer: None,
            body: RequestBody::Json(body),
        }
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Value of a form field, if this is a form request.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        match &self.body {
            RequestBody::Form(pairs) => pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

// Bearer tokens and client secrets stay out of logs.
impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let body = match &self.body {
            RequestBody::Empty => "empty".to_string(),
            RequestBody::Form(pairs) => format!(
                "form[{}]",
                pairs
                    .iter()
                    .map(|(k, _)| k.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
            RequestBody::Json(v) => v.to_string(),
        };
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .field("body", &body)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> RuleSwitchResult<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| RuleSwitchError::Decode(format!("HTTP {} body: {e}", self.status)))
    }
}

/// Abstraction over whatever actually moves bytes.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send one request. Non-2xx statuses are returned as responses, not errors;
    /// `Err` means the request never produced a response.
    async fn send(&self, request: HttpRequest) -> RuleSwitchResult<HttpResponse>;
}
