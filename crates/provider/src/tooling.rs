//! Tooling API client for Account validation rules.
//!
//! Every call takes the [`SessionManager`] explicitly; nothing is fetched or
//! mutated without credentials. Mutations are followed by a full re-query
//! unless the refresh policy says otherwise.

use crate::session::SessionManager;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use ruleswitch_core::error::{RuleSwitchError, RuleSwitchResult};
use ruleswitch_core::{
    BulkToggleReport, ClientConfig, Credentials, RefreshPolicy, ToggleOutcome, ValidationRule,
};
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

/// SOQL for the rule list. Scoped to the Account entity.
pub const ACCOUNT_RULES_QUERY: &str = "SELECT Id,ValidationName,Active,ErrorMessage \
     FROM ValidationRule WHERE EntityDefinition.QualifiedApiName='Account'";

/// Shown in place of a real deployment.
pub const DEPLOY_NOTICE: &str =
    "Deploy functionality would use Metadata API to deploy changes to production/sandbox orgs.";

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    records: Vec<ValidationRule>,
    #[serde(default = "default_done")]
    done: bool,
    #[serde(rename = "totalSize", default)]
    total_size: Option<u64>,
}

fn default_done() -> bool {
    true
}

#[derive(Deserialize)]
struct ApiErrorItem {
    message: String,
    #[serde(rename = "errorCode", default)]
    error_code: Option<String>,
}

pub struct ValidationRuleClient {
    transport: Arc<dyn HttpTransport>,
    config: ClientConfig,
}

impl ValidationRuleClient {
    pub fn new(transport: Arc<dyn HttpTransport>, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch the Account validation rules and replace the cached list.
    ///
    /// The loading flag is set for the duration of the call, whatever the outcome.
    pub async fn list_rules(&self, session: &mut SessionManager) -> RuleSwitchResult<()> {
        let creds = session.credentials()?;

        session.set_loading(true);
        let result = self.query_rules(&creds).await;
        session.set_loading(false);

        let rules = result?;
        tracing::info!(count = rules.len(), "fetched validation rules");
        session.replace_rules(rules);
        Ok(())
    }

    /// Flip one rule's active flag, then resynchronize.
    ///
    /// If the PATCH succeeds but the re-query fails, the cache is marked stale
    /// and the re-query error is returned.
    pub async fn toggle_rule(
        &self,
        session: &mut SessionManager,
        rule_id: &str,
        current_active: bool,
    ) -> RuleSwitchResult<()> {
        let creds = session.credentials()?;
        let target = !current_active;

        patch_active(&*self.transport, &self.config, &creds, rule_id, target).await?;
        tracing::info!(rule_id, active = target, "validation rule updated");

        self.after_mutation(session).await
    }

    /// Set every cached rule to `activate`, one concurrent PATCH per rule.
    ///
    /// Outcomes are collected per rule. The list is re-queried only when every
    /// update succeeded; otherwise the cache is marked stale and the report
    /// tells the caller which rules failed.
    pub async fn toggle_all_rules(
        &self,
        session: &mut SessionManager,
        activate: bool,
    ) -> RuleSwitchResult<BulkToggleReport> {
        let creds = session.credentials()?;
        let ids: Vec<String> = session.rules().iter().map(|r| r.id.clone()).collect();

        tracing::info!(count = ids.len(), activate, "bulk toggling validation rules");

        let semaphore = Arc::new(tokio::sync::Semaphore::new(
            self.config.max_concurrency.max(1),
        ));
        let mut tasks = tokio::task::JoinSet::new();

        for (idx, rule_id) in ids.iter().cloned().enumerate() {
            let transport = self.transport.clone();
            let config = self.config.clone();
            let creds = creds.clone();
            let sem = semaphore.clone();
            tasks.spawn(async move {
                let result = match sem.acquire().await {
                    Ok(_permit) => {
                        patch_active(&*transport, &config, &creds, &rule_id, activate).await
                    }
                    Err(e) => Err(RuleSwitchError::Internal(format!("semaphore closed: {e}"))),
                };
                (idx, result)
            });
        }

        let mut slots: Vec<Option<String>> = vec![None; ids.len()];
        let mut settled = vec![false; ids.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, Ok(()))) => settled[idx] = true,
                Ok((idx, Err(e))) => {
                    tracing::warn!(rule_id = %ids[idx], error = %e, "rule update failed");
                    slots[idx] = Some(e.to_string());
                    settled[idx] = true;
                }
                Err(e) => tracing::warn!(error = %e, "rule update task panicked"),
            }
        }

        let outcomes: Vec<ToggleOutcome> = ids
            .into_iter()
            .zip(slots)
            .zip(settled)
            .map(|((rule_id, error), settled)| ToggleOutcome {
                rule_id,
                requested_active: activate,
                error: if settled {
                    error
                } else {
                    Some("update task did not complete".into())
                },
            })
            .collect();

        let mut report = BulkToggleReport {
            outcomes,
            refreshed: false,
            refresh_error: None,
        };

        if report.all_succeeded() {
            tracing::info!(updated = report.succeeded(), "bulk toggle complete");
            match self.after_mutation(session).await {
                Ok(()) => {
                    report.refreshed = self.config.refresh_policy == RefreshPolicy::AfterMutation;
                }
                Err(e) => report.refresh_error = Some(e.to_string()),
            }
        } else {
            let failed = report.outcomes.len() - report.succeeded();
            tracing::warn!(
                failed,
                succeeded = report.succeeded(),
                "bulk toggle partially failed; rule list is stale"
            );
            session.mark_stale();
        }

        Ok(report)
    }

    /// Placeholder: deployment through the Metadata API is not implemented.
    pub fn deploy_changes(&self) -> &'static str {
        tracing::info!("deploy requested; not implemented");
        DEPLOY_NOTICE
    }

    /// Re-query per the refresh policy. A failed re-query leaves the cache stale.
    async fn after_mutation(&self, session: &mut SessionManager) -> RuleSwitchResult<()> {
        match self.config.refresh_policy {
            RefreshPolicy::AfterMutation => {
                let result = self.list_rules(session).await;
                if result.is_err() {
                    session.mark_stale();
                }
                result
            }
            RefreshPolicy::Manual => {
                session.mark_stale();
                Ok(())
            }
        }
    }

    async fn query_rules(&self, creds: &Credentials) -> RuleSwitchResult<Vec<ValidationRule>> {
        let mut url = tooling_url(&creds.instance_url, &self.config.api_version, &["query", ""])?;
        url.query_pairs_mut().append_pair("q", ACCOUNT_RULES_QUERY);

        let resp = self
            .transport
            .send(HttpRequest::get(url).with_bearer(creds.access_token.clone()))
            .await?;
        ensure_success(&resp)?;

        let body: QueryResponse = resp.json()?;
        if !body.done {
            tracing::warn!(
                returned = body.records.len(),
                total = body.total_size,
                "query result is paginated; only the first page is shown"
            );
        }
        Ok(body.records)
    }
}

async fn patch_active(
    transport: &dyn HttpTransport,
    config: &ClientConfig,
    creds: &Credentials,
    rule_id: &str,
    active: bool,
) -> RuleSwitchResult<()> {
    if rule_id.is_empty() {
        return Err(RuleSwitchError::InvalidInput("rule id must not be empty".into()));
    }
    let url = tooling_url(
        &creds.instance_url,
        &config.api_version,
        &["sobjects", "ValidationRule", rule_id],
    )?;
    let body = serde_json::json!({ "Active": active });
    let resp = transport
        .send(HttpRequest::patch_json(url, body).with_bearer(creds.access_token.clone()))
        .await?;
    ensure_success(&resp)
}

/// `{instance}/services/data/v{version}/tooling/{segments...}`
pub fn tooling_url(instance: &Url, api_version: &str, segments: &[&str]) -> RuleSwitchResult<Url> {
    let version = format!("v{api_version}");
    let mut url = instance.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            RuleSwitchError::InvalidInput(format!("instance URL {instance} cannot be a base"))
        })?;
        path.pop_if_empty()
            .extend(["services", "data", version.as_str(), "tooling"])
            .extend(segments);
    }
    url.set_query(None);
    Ok(url)
}

/// Map a non-2xx Tooling API response to an `Api` error.
fn ensure_success(resp: &HttpResponse) -> RuleSwitchResult<()> {
    if resp.is_success() {
        return Ok(());
    }
    let message = match serde_json::from_str::<Vec<ApiErrorItem>>(&resp.body) {
        Ok(items) if !items.is_empty() => items
            .into_iter()
            .map(|i| match i.error_code {
                Some(code) => format!("{code}: {}", i.message),
                None => i.message,
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ if resp.body.trim().is_empty() => "empty response body".to_string(),
        _ => resp.body.trim().to_string(),
    };
    Err(RuleSwitchError::Api {
        status: resp.status,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_record_url() {
        let instance = Url::parse("https://org.my.salesforce.com").unwrap();
        let url = tooling_url(&instance, "57.0", &["sobjects", "ValidationRule", "03dABC"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://org.my.salesforce.com/services/data/v57.0/tooling/sobjects/ValidationRule/03dABC"
        );
    }

    #[test]
    fn builds_query_url_with_trailing_slash() {
        let instance = Url::parse("https://org.my.salesforce.com/").unwrap();
        let url = tooling_url(&instance, "60.0", &["query", ""]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://org.my.salesforce.com/services/data/v60.0/tooling/query/"
        );
    }

    #[test]
    fn api_error_body_is_decoded() {
        let resp = HttpResponse::new(
            401,
            r#"[{"message":"Session expired or invalid","errorCode":"INVALID_SESSION_ID"}]"#,
        );
        assert_eq!(
            ensure_success(&resp),
            Err(RuleSwitchError::Api {
                status: 401,
                message: "INVALID_SESSION_ID: Session expired or invalid".into(),
            })
        );
    }

    #[test]
    fn non_json_error_body_kept_verbatim() {
        let resp = HttpResponse::new(502, "Bad Gateway\n");
        assert_eq!(
            ensure_success(&resp),
            Err(RuleSwitchError::Api {
                status: 502,
                message: "Bad Gateway".into(),
            })
        );
    }
}
