//! OAuth2 web-server flow against the Salesforce identity provider.
//!
//! Two phases with no shared browser state between them:
//!
//! 1. [`AuthorizationFlow::begin_authorization`] builds the authorize URL the
//!    hosting surface sends the user to.
//! 2. When control returns with `?code=...`, the hosting surface calls
//!    [`AuthorizationFlow::complete_from_redirect`] (or
//!    [`AuthorizationFlow::complete_authorization`] with the bare code), which
//!    exchanges the code at the token endpoint and populates the session.

use crate::session::SessionManager;
use crate::transport::{HttpRequest, HttpTransport};
use ruleswitch_core::config::OAUTH_SCOPES;
use ruleswitch_core::error::{RuleSwitchError, RuleSwitchResult};
use ruleswitch_core::OAuthConfig;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

const AUTHORIZE_PATH: &str = "/services/oauth2/authorize";
const TOKEN_PATH: &str = "/services/oauth2/token";

/// Query parameters consumed by the redirect handler and dropped from the
/// cleaned URL.
const CALLBACK_PARAMS: &[&str] = &["code", "state", "error", "error_description"];

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    instance_url: String,
}

#[derive(Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

pub struct AuthorizationFlow {
    transport: Arc<dyn HttpTransport>,
    config: OAuthConfig,
}

impl AuthorizationFlow {
    pub fn new(transport: Arc<dyn HttpTransport>, config: OAuthConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Authorize URL for the configured Connected App.
    pub fn begin_authorization(&self) -> RuleSwitchResult<Url> {
        let mut url = self.endpoint(AUTHORIZE_PATH)?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", OAUTH_SCOPES);
        tracing::debug!(client_id = %self.config.client_id, "built authorization url");
        Ok(url)
    }

    /// Exchange an authorization code for an access token.
    ///
    /// Issues exactly one token request. On failure the session is left
    /// untouched and the error is returned.
    pub async fn complete_authorization(
        &self,
        session: &mut SessionManager,
        code: &str,
    ) -> RuleSwitchResult<()> {
        let code = code.trim();
        if code.is_empty() {
            return Err(RuleSwitchError::InvalidInput(
                "authorization code must not be empty".into(),
            ));
        }

        let url = self.endpoint(TOKEN_PATH)?;
        let form = vec![
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("client_id".to_string(), self.config.client_id.clone()),
            ("client_secret".to_string(), self.config.client_secret.clone()),
            ("code".to_string(), code.to_string()),
            ("redirect_uri".to_string(), self.config.redirect_uri.clone()),
        ];

        let (token, instance_url) = self.exchange(HttpRequest::post_form(url, form)).await?;
        session.establish(token, instance_url);
        Ok(())
    }

    /// Handle the URL control returned to after the user authorized.
    ///
    /// Returns the same URL with the callback parameters stripped, which is
    /// what the hosting surface should show from then on.
    pub async fn complete_from_redirect(
        &self,
        session: &mut SessionManager,
        redirect_url: &Url,
    ) -> RuleSwitchResult<Url> {
        let code = code_from_redirect(redirect_url)?.ok_or_else(|| {
            RuleSwitchError::InvalidInput("redirect URL carries no `code` parameter".into())
        })?;
        self.complete_authorization(session, &code).await?;
        Ok(strip_callback_params(redirect_url))
    }

    async fn exchange(&self, request: HttpRequest) -> RuleSwitchResult<(String, Url)> {
        let resp = self.transport.send(request).await?;

        if !resp.is_success() {
            let message = match resp.json::<OAuthErrorBody>() {
                Ok(body) => match body.error_description {
                    Some(desc) => format!("{}: {desc}", body.error),
                    None => body.error,
                },
                Err(_) => format!("token endpoint returned HTTP {}", resp.status),
            };
            return Err(RuleSwitchError::Authorization(message));
        }

        let token: TokenResponse = resp.json()?;
        let instance_url = Url::parse(&token.instance_url).map_err(|e| {
            RuleSwitchError::Decode(format!("instance_url {:?}: {e}", token.instance_url))
        })?;
        Ok((token.access_token, instance_url))
    }

    fn endpoint(&self, path: &str) -> RuleSwitchResult<Url> {
        let base = self.config.login_url.trim_end_matches('/');
        Url::parse(&format!("{base}{path}")).map_err(|e| {
            RuleSwitchError::InvalidInput(format!("login URL {:?}: {e}", self.config.login_url))
        })
    }
}

/// Inspect a redirect URL for the authorization result.
///
/// `Ok(Some(code))` when the provider granted access, `Ok(None)` when the URL
/// is not a callback at all, and an `Authorization` error when the provider
/// reported one (e.g. the user denied access).
pub fn code_from_redirect(url: &Url) -> RuleSwitchResult<Option<String>> {
    let mut code = None;
    let mut error = None;
    let mut description = None;
    for (k, v) in url.query_pairs() {
        match &*k {
            "code" if !v.is_empty() => code = Some(v.into_owned()),
            "error" => error = Some(v.into_owned()),
            "error_description" => description = Some(v.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        let message = match description {
            Some(d) => format!("{error}: {d}"),
            None => error,
        };
        return Err(RuleSwitchError::Authorization(message));
    }
    Ok(code)
}

/// Copy of `url` without the OAuth callback parameters.
pub fn strip_callback_params(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !CALLBACK_PARAMS.contains(&&**k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut cleaned = url.clone();
    if kept.is_empty() {
        cleaned.set_query(None);
    } else {
        cleaned.query_pairs_mut().clear().extend_pairs(kept);
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_code() {
        let url = Url::parse("http://localhost:3000/?code=aPrx123%3D%3D").unwrap();
        assert_eq!(code_from_redirect(&url).unwrap().as_deref(), Some("aPrx123=="));
    }

    #[test]
    fn no_code_is_none() {
        let url = Url::parse("http://localhost:3000/").unwrap();
        assert_eq!(code_from_redirect(&url).unwrap(), None);
    }

    #[test]
    fn provider_error_surfaces() {
        let url = Url::parse(
            "http://localhost:3000/?error=access_denied&error_description=end-user+denied+authorization",
        )
        .unwrap();
        let err = code_from_redirect(&url).unwrap_err();
        assert_eq!(
            err,
            RuleSwitchError::Authorization("access_denied: end-user denied authorization".into())
        );
    }

    #[test]
    fn strip_removes_only_callback_params() {
        let url = Url::parse("http://localhost:3000/app?tab=rules&code=abc&state=xyz").unwrap();
        assert_eq!(
            strip_callback_params(&url).as_str(),
            "http://localhost:3000/app?tab=rules"
        );

        let bare = Url::parse("http://localhost:3000/?code=abc").unwrap();
        assert_eq!(strip_callback_params(&bare).as_str(), "http://localhost:3000/");
    }
}
