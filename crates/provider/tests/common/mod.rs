//! Shared helpers: a recording transport with scripted responses.

#![allow(dead_code)]

use async_trait::async_trait;
use ruleswitch_core::error::RuleSwitchResult;
use ruleswitch_core::ValidationRule;
use ruleswitch_provider::{HttpRequest, HttpResponse, HttpTransport, Method, SessionManager};
use std::sync::{Arc, Mutex};

pub const INSTANCE: &str = "https://org.my.salesforce.com";

type Responder = dyn Fn(&HttpRequest) -> RuleSwitchResult<HttpResponse> + Send + Sync;

/// Records every request and answers with the scripted responder.
pub struct FakeTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responder: Box<Responder>,
}

impl FakeTransport {
    pub fn new(
        responder: impl Fn(&HttpRequest) -> RuleSwitchResult<HttpResponse> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> RuleSwitchResult<HttpResponse> {
        let resp = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        resp
    }
}

/// Tooling query response body for the given `(id, active)` pairs.
pub fn query_body(rules: &[(&str, bool)]) -> String {
    let records: Vec<serde_json::Value> = rules
        .iter()
        .map(|(id, active)| {
            serde_json::json!({
                "attributes": {"type": "ValidationRule"},
                "Id": id,
                "ValidationName": format!("Rule_{id}"),
                "Active": active,
                "ErrorMessage": format!("Error {id}"),
            })
        })
        .collect();
    serde_json::json!({
        "size": records.len(),
        "totalSize": records.len(),
        "done": true,
        "records": records,
    })
    .to_string()
}

pub fn rule(id: &str, active: bool) -> ValidationRule {
    ValidationRule {
        id: id.into(),
        name: format!("Rule_{id}"),
        error_message: format!("Error {id}"),
        active,
    }
}

pub fn authenticated_session() -> SessionManager {
    let mut session = SessionManager::new();
    session.establish("T1".into(), INSTANCE.parse().unwrap());
    session
}

/// Last path segment of a PATCH request, i.e. the rule id.
pub fn patched_id(req: &HttpRequest) -> String {
    req.url
        .path_segments()
        .and_then(|mut s| s.next_back())
        .unwrap_or_default()
        .to_string()
}
