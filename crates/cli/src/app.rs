//! Hosting surface: owns the session and routes user actions.
//!
//! Errors are logged and kept in [`ViewState`] so the next render shows them.

use ruleswitch_core::error::{RuleSwitchError, RuleSwitchResult};
use ruleswitch_provider::{AuthorizationFlow, SessionManager, ValidationRuleClient};
use url::Url;

/// One user action on the management panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Refresh,
    /// Rule id, or 1-based position in the displayed list.
    Toggle(String),
    ActivateAll,
    DeactivateAll,
    Deploy,
    Logout,
    Help,
    Quit,
}

impl Action {
    pub fn parse(line: &str) -> Result<Self, String> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((cmd, args)) = words.split_first() else {
            return Err("empty command".into());
        };
        let cmd = cmd.to_ascii_lowercase();

        let action = match cmd.as_str() {
            "toggle" | "t" => {
                return match args {
                    [target] => Ok(Action::Toggle(target.to_string())),
                    _ => Err("usage: toggle <rule id | number>".into()),
                }
            }
            "refresh" | "r" | "list" => Action::Refresh,
            "activate-all" => Action::ActivateAll,
            "deactivate-all" => Action::DeactivateAll,
            "deploy" => Action::Deploy,
            "logout" => Action::Logout,
            "help" | "?" => Action::Help,
            "quit" | "exit" | "q" => Action::Quit,
            other => return Err(format!("unknown command `{other}` (try `help`)")),
        };

        if !args.is_empty() {
            return Err(format!("`{cmd}` takes no arguments"));
        }
        Ok(action)
    }
}

impl Action {
    /// Actions that wait on the Tooling API.
    pub fn hits_network(&self) -> bool {
        matches!(
            self,
            Action::Refresh | Action::Toggle(_) | Action::ActivateAll | Action::DeactivateAll
        )
    }
}

pub const HELP: &str = "commands: refresh | toggle <id|n> | activate-all | deactivate-all | deploy | logout | quit";

/// Transient messages shown by the next render.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub last_error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    flow: AuthorizationFlow,
    client: ValidationRuleClient,
    session: SessionManager,
    view: ViewState,
}

impl App {
    pub fn new(flow: AuthorizationFlow, client: ValidationRuleClient) -> Self {
        Self {
            flow,
            client,
            session: SessionManager::new(),
            view: ViewState::default(),
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn authorization_url(&self) -> RuleSwitchResult<Url> {
        self.flow.begin_authorization()
    }

    /// Finish login from the URL the identity provider redirected to.
    pub async fn login_from_redirect(&mut self, redirect: &str) -> RuleSwitchResult<Url> {
        self.view = ViewState::default();
        let result = match Url::parse(redirect.trim()) {
            Ok(url) => self.flow.complete_from_redirect(&mut self.session, &url).await,
            Err(e) => Err(RuleSwitchError::InvalidInput(format!(
                "not a URL ({e}); paste the full redirect URL"
            ))),
        };
        if let Err(e) = &result {
            self.record_error(e);
        }
        result
    }

    /// Raise the loading flag ahead of a network action so a render taken
    /// before `dispatch` shows it. Returns whether the flag was raised.
    pub fn begin(&mut self, action: &Action) -> bool {
        if action.hits_network() && self.session.is_authenticated() {
            self.session.set_loading(true);
            return true;
        }
        false
    }

    /// Handle one input line while logged out: commands are honored where they
    /// make sense, anything else is taken as the redirect URL.
    pub async fn handle_logged_out(&mut self, line: &str) -> Flow {
        match Action::parse(line) {
            Ok(Action::Quit) => Flow::Quit,
            Ok(Action::Help) => self.dispatch(Action::Help).await,
            Ok(_) => {
                self.view = ViewState {
                    last_error: Some(
                        "not logged in: paste the URL you were redirected to".into(),
                    ),
                    notice: None,
                };
                Flow::Continue
            }
            Err(_) => {
                if let Ok(cleaned) = self.login_from_redirect(line).await {
                    tracing::info!(url = %cleaned, "login complete");
                }
                Flow::Continue
            }
        }
    }

    pub async fn dispatch(&mut self, action: Action) -> Flow {
        self.view = ViewState::default();
        let result = match action {
            Action::Refresh => self.client.list_rules(&mut self.session).await,
            Action::Toggle(target) => self.toggle(&target).await,
            Action::ActivateAll => self.toggle_all(true).await,
            Action::DeactivateAll => self.toggle_all(false).await,
            Action::Deploy => {
                self.view.notice = Some(self.client.deploy_changes().to_string());
                Ok(())
            }
            Action::Logout => {
                self.session.clear();
                self.view.notice = Some("Logged out.".into());
                Ok(())
            }
            Action::Help => {
                self.view.notice = Some(HELP.into());
                Ok(())
            }
            Action::Quit => return Flow::Quit,
        };

        self.session.set_loading(false);
        if let Err(e) = result {
            self.record_error(&e);
        }
        Flow::Continue
    }

    async fn toggle(&mut self, target: &str) -> RuleSwitchResult<()> {
        let rules = self.session.rules();
        let found = match target.parse::<usize>() {
            Ok(n) if n >= 1 && n <= rules.len() => Some(&rules[n - 1]),
            _ => rules.iter().find(|r| r.id == target),
        };
        let Some(rule) = found else {
            return Err(RuleSwitchError::InvalidInput(format!(
                "no rule `{target}` in the current list"
            )));
        };
        let (id, active) = (rule.id.clone(), rule.active);
        self.client.toggle_rule(&mut self.session, &id, active).await
    }

    async fn toggle_all(&mut self, activate: bool) -> RuleSwitchResult<()> {
        let report = self.client.toggle_all_rules(&mut self.session, activate).await?;
        if !report.all_succeeded() {
            let failed: Vec<String> = report
                .failures()
                .map(|o| format!("{} ({})", o.rule_id, o.error.as_deref().unwrap_or("unknown")))
                .collect();
            self.view.last_error = Some(format!(
                "{} of {} updates failed: {}; run `refresh` to see the current state",
                failed.len(),
                report.outcomes.len(),
                failed.join(", ")
            ));
        } else if let Some(err) = &report.refresh_error {
            self.view.last_error = Some(format!(
                "updated {} rule(s) but the refresh failed: {err}; run `refresh` to see the current state",
                report.succeeded()
            ));
        } else {
            let verb = if activate { "Activated" } else { "Deactivated" };
            self.view.notice = Some(format!("{verb} {} rule(s).", report.succeeded()));
        }
        Ok(())
    }

    fn record_error(&mut self, e: &RuleSwitchError) {
        tracing::error!(error = %e, "action failed");
        self.view.last_error = Some(e.to_string());
    }
}
