//! Collect daily commit counts per topic and merge them into the history file.

use commits_spread::{collect, Config, History};
use eyre::WrapErr as _;
use octocat::GithubClient;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().wrap_err("Reading configuration")?;
    if let Some(repository) = &config.repository {
        tracing::debug!("Running for repository {repository}");
    }

    let github = GithubClient::with_base(config.api_base.clone(), config.token.clone());
    let collected = collect(&github, &config.author_filter())
        .await
        .wrap_err("Collecting commit history")?;

    if !collected.skipped.is_empty() {
        tracing::warn!("Skipped repositories: {}", collected.skipped.join(", "));
    }
    if !collected.incomplete.is_empty() {
        tracing::warn!(
            "Incomplete commit history for: {}",
            collected.incomplete.join(", ")
        );
    }

    let history = History::new(config.history_file.clone(), config.merge_policy);
    let days = collected.summaries.len();
    let saved = history
        .save(collected.summaries)
        .await
        .wrap_err_with(|| format!("Saving commit history to {}", history.path()))?;

    tracing::info!(
        "Counted {} commits over {days} days in {} repositories; {} now holds {} days",
        collected.commits,
        collected.repositories,
        history.path(),
        saved.len()
    );

    Ok(())
}
