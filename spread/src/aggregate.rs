//! Folding commits into per-day counts.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;
use octocat::models::Commit;
use serde::{Deserialize, Serialize};

/// Commit counts for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    /// The day, as `YYYY-MM-DD`.
    pub date: NaiveDate,

    /// Distinct commits on this day in repositories carrying each topic.
    pub commits_by_topics: BTreeMap<String, usize>,

    /// Distinct commits on this day across all repositories.
    pub total_count: usize,
}

#[derive(Debug, Default)]
struct Day {
    commits: HashSet<String>,
    topics: BTreeMap<String, HashSet<String>>,
}

/// Accumulates commit observations into [DailySummary] records.
///
/// Commits are tracked by SHA, so observing the same commit twice never
/// changes a count, and the order of observations does not matter.
#[derive(Debug, Default)]
pub struct Aggregator {
    days: BTreeMap<NaiveDate, Day>,
}

impl Aggregator {
    /// An empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record commit `sha` on `date`, in a repository labelled with `topics`.
    pub fn observe<'t, I>(&mut self, date: NaiveDate, sha: &str, topics: I)
    where
        I: IntoIterator<Item = &'t str>,
    {
        let day = self.days.entry(date).or_default();
        day.commits.insert(sha.to_owned());
        for topic in topics {
            day.topics
                .entry(topic.to_owned())
                .or_default()
                .insert(sha.to_owned());
        }
    }

    /// Record every commit of one repository.
    pub fn observe_commits(&mut self, commits: &[Commit], topics: &BTreeSet<String>) {
        for commit in commits {
            self.observe(commit.day(), &commit.sha, topics.iter().map(String::as_str));
        }
    }

    /// Number of days with at least one commit.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Whether no commit has been observed.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Per-day summaries, ascending by date.
    ///
    /// Days whose commits all came from repositories without topics are
    /// included with an empty topic map.
    pub fn finish(self) -> Vec<DailySummary> {
        self.days
            .into_iter()
            .map(|(date, day)| DailySummary {
                date,
                commits_by_topics: day
                    .topics
                    .into_iter()
                    .map(|(topic, shas)| (topic, shas.len()))
                    .collect(),
                total_count: day.commits.len(),
            })
            .collect()
    }
}
