//! CLI for managing Salesforce Account validation rules.
//!
//! Flow: authorize URL -> user logs in -> redirect URL pasted back ->
//! token exchange -> Tooling API queries and updates.

mod app;
mod view;

use app::{Action, App, Flow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ruleswitch_core::{ClientConfig, OAuthConfig, RefreshPolicy};
use ruleswitch_provider::{AuthorizationFlow, ReqwestTransport, ValidationRuleClient};
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;

#[derive(Parser, Debug)]
#[command(
    name = "ruleswitch",
    version,
    about = "Toggle Salesforce Account validation rules"
)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Connected App consumer key.
    #[arg(long, env = "SF_CLIENT_ID", default_value = ruleswitch_core::config::DEFAULT_CLIENT_ID, global = true)]
    client_id: String,

    /// Connected App consumer secret.
    #[arg(
        long,
        env = "SF_CLIENT_SECRET",
        default_value = ruleswitch_core::config::DEFAULT_CLIENT_SECRET,
        hide_env_values = true,
        hide_default_value = true,
        global = true
    )]
    client_secret: String,

    #[arg(long, env = "SF_REDIRECT_URI", default_value = ruleswitch_core::config::DEFAULT_REDIRECT_URI, global = true)]
    redirect_uri: String,

    /// Identity provider base, e.g. https://test.salesforce.com for sandboxes.
    #[arg(long, env = "SF_LOGIN_URL", default_value = ruleswitch_core::config::DEFAULT_LOGIN_URL, global = true)]
    login_url: String,

    #[arg(long, env = "SF_API_VERSION", default_value = ruleswitch_core::config::DEFAULT_API_VERSION, global = true)]
    api_version: String,

    /// Re-query after every mutation, or only on `refresh`.
    #[arg(long, env = "RULESWITCH_REFRESH", value_enum, default_value_t = RefreshArg::AfterMutation, global = true)]
    refresh: RefreshArg,

    /// Max concurrent updates during activate-all / deactivate-all.
    #[arg(long, env = "RULESWITCH_MAX_CONCURRENCY", default_value_t = ruleswitch_core::config::DEFAULT_MAX_CONCURRENCY, global = true)]
    max_concurrency: usize,

    #[arg(long, env = "RULESWITCH_TIMEOUT_SECS", default_value_t = ruleswitch_core::config::DEFAULT_TIMEOUT_SECS, global = true)]
    timeout_secs: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RefreshArg {
    AfterMutation,
    Manual,
}

impl ConfigArgs {
    fn oauth(&self) -> OAuthConfig {
        OAuthConfig {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uri: self.redirect_uri.clone(),
            login_url: self.login_url.clone(),
        }
    }

    fn client(&self) -> ClientConfig {
        ClientConfig {
            api_version: self.api_version.clone(),
            refresh_policy: match self.refresh {
                RefreshArg::AfterMutation => RefreshPolicy::AfterMutation,
                RefreshArg::Manual => RefreshPolicy::Manual,
            },
            max_concurrency: self.max_concurrency,
            request_timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the URL that starts the login.
    AuthorizeUrl,

    /// Complete login from a redirect URL and print the rules once.
    List {
        /// The URL the browser was redirected to (contains `code=`).
        #[arg(short, long)]
        redirect_url: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Interactive session: log in, then refresh and toggle rules.
    Manage {
        /// Skip the prompt and complete login from this redirect URL.
        #[arg(short, long)]
        redirect_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client_config = cli.config.client();
    let transport = Arc::new(ReqwestTransport::new(client_config.request_timeout)?);
    let flow = AuthorizationFlow::new(transport.clone(), cli.config.oauth());
    let client = ValidationRuleClient::new(transport, client_config);
    let mut app = App::new(flow, client);

    match cli.command {
        Commands::AuthorizeUrl => {
            println!("{}", app.authorization_url()?);
        }
        Commands::List { redirect_url, json } => {
            // Failures are already logged by the app; only the exit code is left.
            if app.login_from_redirect(&redirect_url).await.is_err() {
                return Ok(ExitCode::FAILURE);
            }
            app.dispatch(Action::Refresh).await;
            if app.view_state().last_error.is_some() {
                return Ok(ExitCode::FAILURE);
            }
            let rules = app.session().rules();
            if json {
                println!("{}", serde_json::to_string_pretty(rules)?);
            } else {
                for rule in rules {
                    let status = if rule.active { "Active" } else { "Inactive" };
                    println!("{}\t{}\t{}\t{}", rule.id, status, rule.name, rule.error_message);
                }
            }
        }
        Commands::Manage { redirect_url } => {
            run_interactive(&mut app, redirect_url).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Read-eval-render loop over stdin.
async fn run_interactive(
    app: &mut App,
    redirect_url: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let auth_url = app.authorization_url()?;

    if let Some(redirect) = redirect_url {
        if let Ok(cleaned) = app.login_from_redirect(&redirect).await {
            tracing::info!(url = %cleaned, "login complete");
        }
    }

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!(
            "{}",
            view::render(app.session(), app.view_state(), Some(&auth_url))
        );
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if !app.session().is_authenticated() {
            if app.handle_logged_out(line).await == Flow::Quit {
                break;
            }
            continue;
        }

        match Action::parse(line) {
            Ok(action) => {
                if app.begin(&action) {
                    print!(
                        "{}",
                        view::render(app.session(), app.view_state(), Some(&auth_url))
                    );
                }
                if app.dispatch(action).await == Flow::Quit {
                    break;
                }
            }
            Err(msg) => println!("{msg}"),
        }
    }

    Ok(())
}
