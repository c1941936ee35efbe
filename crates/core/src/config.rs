//! Configuration for the authorization flow and the Tooling API client.
//!
//! Fallback values match the placeholders a Connected App ships with, so an
//! unconfigured run still produces a well-formed authorization URL.

use std::time::Duration;

pub const DEFAULT_CLIENT_ID: &str = "YOUR_CONNECTED_APP_CONSUMER_KEY";
pub const DEFAULT_CLIENT_SECRET: &str = "YOUR_CONNECTED_APP_CONSUMER_SECRET";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000";
pub const DEFAULT_LOGIN_URL: &str = "https://login.salesforce.com";
pub const DEFAULT_API_VERSION: &str = "57.0";
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Scopes requested at the authorize endpoint.
pub const OAUTH_SCOPES: &str = "api refresh_token web";

/// Connected App settings.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Identity provider base, e.g. `https://login.salesforce.com`.
    pub login_url: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.into(),
            client_secret: DEFAULT_CLIENT_SECRET.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.into(),
            login_url: DEFAULT_LOGIN_URL.into(),
        }
    }
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("login_url", &self.login_url)
            .finish()
    }
}

/// What happens to the cached rule list after a mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Re-query the full list after every successful mutation.
    #[default]
    AfterMutation,
    /// Leave the cache as-is and mark it stale; the caller refreshes.
    Manual,
}

/// Tooling API client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// REST API version without the `v` prefix, e.g. `57.0`.
    pub api_version: String,
    pub refresh_policy: RefreshPolicy,
    /// Upper bound on in-flight PATCH requests during a bulk toggle.
    pub max_concurrency: usize,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.into(),
            refresh_policy: RefreshPolicy::default(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_placeholders() {
        let cfg = OAuthConfig::default();
        assert_eq!(cfg.client_id, DEFAULT_CLIENT_ID);
        assert_eq!(cfg.login_url, "https://login.salesforce.com");
        assert!(!format!("{cfg:?}").contains(DEFAULT_CLIENT_SECRET));
    }

    #[test]
    fn client_defaults() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.api_version, "57.0");
        assert_eq!(cfg.refresh_policy, RefreshPolicy::AfterMutation);
        assert_eq!(cfg.max_concurrency, 8);
    }
}
