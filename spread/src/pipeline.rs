//! One collection run: list repositories, gather topics and commits, aggregate.

use octocat::{AuthorFilter, GithubClient};

use crate::aggregate::{Aggregator, DailySummary};

/// What a collection run found.
#[derive(Debug, Default)]
pub struct Collected {
    /// Per-day summaries, ascending by date.
    pub summaries: Vec<DailySummary>,

    /// Repositories listed for the account.
    pub repositories: usize,

    /// Authored commits counted, before removing duplicates.
    pub commits: usize,

    /// Repositories left out because their topics or commits could not be listed.
    pub skipped: Vec<String>,

    /// Repositories whose commit listing stopped early; their commits are partial.
    pub incomplete: Vec<String>,
}

/// Collect per-day commit counts for every repository visible to `github`.
///
/// Repositories are processed one at a time. Failing to list the
/// repositories ends the run. A repository whose topics cannot be fetched is
/// skipped, and one whose commit listing fails part way contributes the
/// commits gathered before the failure.
#[tracing::instrument(skip_all, fields(login = filter.login()))]
pub async fn collect(
    github: &GithubClient,
    filter: &AuthorFilter,
) -> Result<Collected, octocat::Error> {
    let repositories = github.repositories().await?;
    tracing::info!("Found {} repositories", repositories.len());

    let mut aggregator = Aggregator::new();
    let mut collected = Collected {
        repositories: repositories.len(),
        ..Default::default()
    };

    for repository in &repositories {
        let owner = repository.owner.login.as_str();
        let name = repository.name.as_str();
        let full_name = format!("{owner}/{name}");

        let topics = match github.topics(owner, name).await {
            Ok(topics) => topics,
            Err(error) => {
                tracing::warn!("Skipping {full_name}, topics unavailable: {error}");
                collected.skipped.push(full_name);
                continue;
            }
        };

        let authored = match github.authored_commits(owner, name, filter).await {
            Ok(authored) => authored,
            Err(error) => {
                tracing::warn!("Skipping {full_name}, commits unavailable: {error}");
                collected.skipped.push(full_name);
                continue;
            }
        };

        if authored.error.is_some() {
            collected.incomplete.push(full_name.clone());
        }

        tracing::info!(
            topics = topics.len(),
            "{full_name}: {} of {} commits authored by {}",
            authored.commits.len(),
            authored.seen,
            filter.login()
        );

        collected.commits += authored.commits.len();
        aggregator.observe_commits(&authored.commits, &topics);
    }

    tracing::debug!("Commits fall on {} days", aggregator.len());
    collected.summaries = aggregator.finish();
    Ok(collected)
}
