//! Salesforce OAuth authorization flow and Tooling API client.

pub mod auth;
pub mod http;
pub mod session;
pub mod tooling;
pub mod transport;

pub use auth::AuthorizationFlow;
pub use http::ReqwestTransport;
pub use session::SessionManager;
pub use tooling::ValidationRuleClient;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, RequestBody};
