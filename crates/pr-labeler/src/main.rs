//! GitHub Actions entry point for the pull request labeler.
//!
//! Reads the standard Actions environment, handles the triggering event and
//! writes step outputs. Run `pr-labeler --help` for every option.

// CLI binaries legitimately need println! for workflow commands
#![allow(clippy::disallowed_macros)]

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pr_labeler::github::client::{DEFAULT_API_URL, DEFAULT_GRAPHQL_URL};
use pr_labeler::{
    dispatch, write_outcome, GitHubClient, Policy, PolicyConfig, RepoEvent, RepoRef,
    WorkflowOutputs,
};

#[derive(Parser)]
#[command(name = "pr-labeler")]
#[command(about = "Label pull requests by size, server-only changes and review state")]
#[command(version)]
struct Cli {
    /// GitHub token (falls back to GITHUB_TOKEN)
    #[arg(long, env = "INPUT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Repository in owner/repo format
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: String,

    /// Name of the triggering event
    #[arg(long, env = "GITHUB_EVENT_NAME")]
    event_name: String,

    /// Path to the event payload JSON
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: PathBuf,

    /// File step outputs are appended to
    #[arg(long, env = "GITHUB_OUTPUT")]
    output_file: Option<PathBuf>,

    /// REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// GraphQL endpoint
    #[arg(long, env = "GITHUB_GRAPHQL_URL", default_value = DEFAULT_GRAPHQL_URL)]
    graphql_url: String,

    /// YAML policy file overriding the built-in labels and patterns
    #[arg(long, env = "PR_LABELER_POLICY")]
    policy: Option<PathBuf>,

    /// Enable debug logging (Actions sets RUNNER_DEBUG=1 for step debugging)
    #[arg(long, env = "RUNNER_DEBUG", value_parser = FalseyValueParser::new())]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(debug: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_target(false))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_ansi(false))
            .with(filter)
            .init();
    }
}

fn load_policy(path: Option<&Path>) -> Result<Policy> {
    let config = match path {
        Some(path) => {
            info!("Loading policy from {}", path.display());
            PolicyConfig::from_file(path)?
        }
        None => PolicyConfig::default(),
    };
    config.compile().context("Invalid labeling policy")
}

async fn run(cli: Cli) -> Result<()> {
    let token = cli
        .token
        .filter(|token| !token.is_empty())
        .or_else(|| std::env::var("GITHUB_TOKEN").ok())
        .context("No GitHub token: pass --token or set INPUT_TOKEN / GITHUB_TOKEN")?;

    let repo = RepoRef::parse(&cli.repository)?;
    let policy = load_policy(cli.policy.as_deref())?;
    let event = RepoEvent::from_file(&cli.event_name, &cli.event_path)
        .with_context(|| format!("Failed to read event payload {}", cli.event_path.display()))?;

    let client = GitHubClient::new(&token, repo)?
        .with_api_url(&cli.api_url)
        .with_graphql_url(&cli.graphql_url);
    info!(repo = %client.repo(), event = event.name(), "Handling event");

    let outcome = dispatch(&client, &policy, &event)
        .await
        .with_context(|| format!("Failed to handle {} event", event.name()))?;

    write_outcome(&WorkflowOutputs::new(cli.output_file), &outcome)
        .context("Failed to write step outputs")?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.json_logs);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            println!("::error::Something went wrong");
            ExitCode::FAILURE
        }
    }
}
