//! Text rendering of the session: a login prompt or the management panel.

use crate::app::ViewState;
use ruleswitch_provider::SessionManager;
use url::Url;

const TITLE: &str = "Salesforce Validation Rules Manager";

/// Render the current state. Pure: no I/O, no side effects.
pub fn render(session: &SessionManager, state: &ViewState, auth_url: Option<&Url>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{TITLE}\n"));
    out.push_str(&format!("{}\n", "=".repeat(TITLE.len())));

    if !session.is_authenticated() {
        out.push_str("[login] Login to Salesforce\n");
        if let Some(url) = auth_url {
            out.push_str("  Open this URL in a browser:\n");
            out.push_str(&format!("  {url}\n"));
            out.push_str("  Then paste the URL you were redirected to.\n");
        }
    } else {
        render_panel(&mut out, session);
    }

    if let Some(notice) = &state.notice {
        out.push_str(&format!("* {notice}\n"));
    }
    if let Some(err) = &state.last_error {
        out.push_str(&format!("! error: {err}\n"));
    }
    out
}

fn render_panel(out: &mut String, session: &SessionManager) {
    out.push_str("Connected to Salesforce\n");
    if session.is_loading() {
        out.push_str("[refresh] Loading...\n");
    } else {
        out.push_str("[refresh] Get Validation Rules\n");
    }

    let rules = session.rules();
    if rules.is_empty() {
        return;
    }

    out.push('\n');
    if session.is_stale() {
        out.push_str("Account Validation Rules (stale: run `refresh`)\n");
    } else {
        out.push_str("Account Validation Rules\n");
    }
    out.push_str(
        "[activate-all] Activate All  [deactivate-all] Deactivate All  [deploy] Deploy Changes\n",
    );

    for (i, rule) in rules.iter().enumerate() {
        let (status, action) = if rule.active {
            ("Active", "Deactivate")
        } else {
            ("Inactive", "Activate")
        };
        out.push_str(&format!(
            "{:>3}. {}: {} - {}   [toggle {}] {}\n",
            i + 1,
            rule.name,
            rule.error_message,
            status,
            rule.id,
            action
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_shows_login() {
        let session = SessionManager::new();
        let url = Url::parse("https://login.salesforce.com/services/oauth2/authorize").unwrap();
        let text = render(&session, &ViewState::default(), Some(&url));
        assert!(text.contains("[login] Login to Salesforce"));
        assert!(text.contains(url.as_str()));
        assert!(!text.contains("Connected"));
    }

    #[test]
    fn authenticated_without_rules_shows_refresh_only() {
        let mut session = SessionManager::new();
        session.establish("T1".into(), "https://org.my.salesforce.com".parse().unwrap());
        let text = render(&session, &ViewState::default(), None);
        assert!(text.contains("Connected to Salesforce"));
        assert!(text.contains("[refresh] Get Validation Rules"));
        assert!(!text.contains("Activate All"));
    }

    #[test]
    fn loading_replaces_refresh_label() {
        let mut session = SessionManager::new();
        session.establish("T1".into(), "https://org.my.salesforce.com".parse().unwrap());
        session.set_loading(true);
        let text = render(&session, &ViewState::default(), None);
        assert!(text.contains("[refresh] Loading..."));
        assert!(!text.contains("Get Validation Rules"));
    }

    #[test]
    fn shows_error_and_notice() {
        let session = SessionManager::new();
        let state = ViewState {
            last_error: Some("boom".into()),
            notice: Some("Logged out.".into()),
        };
        let text = render(&session, &state, None);
        assert!(text.contains("! error: boom"));
        assert!(text.contains("* Logged out."));
    }
}
