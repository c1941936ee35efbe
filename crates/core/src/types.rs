//! Domain types for the validation rule manager.

use serde::{Deserialize, Serialize};
use url::Url;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// OAuth credentials held for one authorization cycle.
///
/// Never persisted. `Debug` redacts the access token.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub instance_url: Option<Url>,
}

impl Session {
    /// Both the token and the instance URL are present.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.instance_url.is_some()
    }

    /// Borrowed view of the credentials, if the session is authenticated.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.access_token, &self.instance_url) {
            (Some(token), Some(url)) => Some(Credentials {
                access_token: token.clone(),
                instance_url: url.clone(),
            }),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("instance_url", &self.instance_url.as_ref().map(Url::as_str))
            .finish()
    }
}

/// Owned credential pair handed to request tasks.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub instance_url: Url,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("instance_url", &self.instance_url.as_str())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Validation rules
// ---------------------------------------------------------------------------

/// A `ValidationRule` Tooling API record, field names as the API returns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "ValidationName", default)]
    pub name: String,
    #[serde(rename = "ErrorMessage", default)]
    pub error_message: String,
    #[serde(rename = "Active")]
    pub active: bool,
}

// ---------------------------------------------------------------------------
// Bulk toggle outcomes
// ---------------------------------------------------------------------------

/// Result of one PATCH within a bulk toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub rule_id: String,
    pub requested_active: bool,
    /// `None` on success, the error message otherwise.
    pub error: Option<String>,
}

impl ToggleOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-rule outcomes of `toggle_all_rules`, in cached rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkToggleReport {
    pub outcomes: Vec<ToggleOutcome>,
    /// Whether the rule list was re-queried afterwards.
    pub refreshed: bool,
    /// Set when every update succeeded but the follow-up re-query failed.
    pub refresh_error: Option<String>,
}

impl BulkToggleReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ToggleOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(ToggleOutcome::is_success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_requires_token_and_instance() {
        let mut s = Session::default();
        assert!(!s.is_authenticated());
        s.access_token = Some("T1".into());
        assert!(!s.is_authenticated());
        assert!(s.credentials().is_none());
        s.instance_url = Some("https://org.my.salesforce.com".parse().unwrap());
        assert!(s.is_authenticated());
        assert_eq!(s.credentials().unwrap().access_token, "T1");
    }

    #[test]
    fn debug_redacts_token() {
        let s = Session {
            access_token: Some("super-secret".into()),
            instance_url: None,
        };
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn rule_deserializes_tooling_record() {
        let json = r#"{
            "attributes": {"type": "ValidationRule", "url": "/x"},
            "Id": "03d000000000001",
            "ValidationName": "Require_Phone",
            "Active": true,
            "ErrorMessage": "Phone is required"
        }"#;
        let rule: ValidationRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.id, "03d000000000001");
        assert_eq!(rule.name, "Require_Phone");
        assert!(rule.active);
    }

    #[test]
    fn report_counts_failures() {
        let report = BulkToggleReport {
            outcomes: vec![
                ToggleOutcome {
                    rule_id: "a".into(),
                    requested_active: true,
                    error: None,
                },
                ToggleOutcome {
                    rule_id: "b".into(),
                    requested_active: true,
                    error: Some("boom".into()),
                },
            ],
            refreshed: false,
            refresh_error: None,
        };
        assert_eq!(report.succeeded(), 1);
        assert!(!report.all_succeeded());
        assert_eq!(report.failures().next().unwrap().rule_id, "b");
    }
}
