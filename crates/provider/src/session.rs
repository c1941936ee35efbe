//! Session state for one authorization cycle.
//!
//! Lifecycle: `new()` on startup, `establish()` once the authorization flow
//! exchanges a code, `clear()` on logout. Nothing here touches the network.

use ruleswitch_core::error::{RuleSwitchError, RuleSwitchResult};
use ruleswitch_core::{Credentials, Session, ValidationRule};
use url::Url;

/// Owns the session credentials plus the cached rule list.
///
/// The rule list is a read-through cache of the remote state: it is only
/// ever replaced wholesale by a successful query.
#[derive(Debug, Default)]
pub struct SessionManager {
    session: Session,
    rules: Vec<ValidationRule>,
    loading: bool,
    stale: bool,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store credentials returned by the token endpoint.
    pub fn establish(&mut self, access_token: String, instance_url: Url) {
        tracing::info!(instance_url = %instance_url, "session established");
        self.session = Session {
            access_token: Some(access_token),
            instance_url: Some(instance_url),
        };
    }

    /// Logout: forget credentials and everything fetched with them.
    pub fn clear(&mut self) {
        if self.session.is_authenticated() {
            tracing::info!("session cleared");
        }
        *self = Self::default();
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Credentials for an API call, or `NotAuthenticated`.
    pub fn credentials(&self) -> RuleSwitchResult<Credentials> {
        self.session
            .credentials()
            .ok_or(RuleSwitchError::NotAuthenticated)
    }

    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The cache may not reflect mutations made since the last query.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Also raised by hosting surfaces just before awaiting a call that queries.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub(crate) fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub(crate) fn replace_rules(&mut self, rules: Vec<ValidationRule>) {
        self.rules = rules;
        self.stale = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str) -> ValidationRule {
        ValidationRule {
            id: id.into(),
            name: format!("Rule_{id}"),
            error_message: String::new(),
            active: true,
        }
    }

    #[test]
    fn starts_empty() {
        let sm = SessionManager::new();
        assert!(!sm.is_authenticated());
        assert!(sm.rules().is_empty());
        assert!(!sm.is_loading());
        assert_eq!(sm.credentials(), Err(RuleSwitchError::NotAuthenticated));
    }

    #[test]
    fn establish_then_clear() {
        let mut sm = SessionManager::new();
        sm.establish("T1".into(), "https://org.my.salesforce.com".parse().unwrap());
        sm.replace_rules(vec![rule("a")]);
        assert!(sm.is_authenticated());
        assert_eq!(sm.credentials().unwrap().access_token, "T1");

        sm.clear();
        assert!(!sm.is_authenticated());
        assert!(sm.rules().is_empty());
    }

    #[test]
    fn replace_clears_stale() {
        let mut sm = SessionManager::new();
        sm.mark_stale();
        assert!(sm.is_stale());
        sm.replace_rules(vec![rule("a"), rule("b")]);
        assert!(!sm.is_stale());
        assert_eq!(sm.rules().len(), 2);
    }
}
