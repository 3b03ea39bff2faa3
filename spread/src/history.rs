//! The persisted commit history file.

use std::collections::BTreeMap;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use serde::Serialize as _;
use thiserror::Error;

use crate::aggregate::DailySummary;

/// Default location of the history file, relative to the working directory.
pub const DEFAULT_HISTORY_FILE: &str = "commit_history.json";

/// How freshly collected summaries are combined with the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Replace the whole file, keeping at most `limit` of the most recent days.
    Overwrite {
        /// Number of most recent days to keep.
        limit: Option<usize>,
    },

    /// Add days missing from the file. A day already on disk is never
    /// updated, even if more commits for it were found since.
    #[default]
    Append,

    /// Add missing days, and rewrite days already on disk with the new counts.
    Replace,
}

/// Errors reading or writing the history file.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The file exists but could not be read.
    #[error("Reading history from {path}")]
    Read {
        /// History file
        path: Utf8PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// The file is not a JSON list of daily summaries.
    #[error("Parsing history in {path}")]
    Parse {
        /// History file
        path: Utf8PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The summaries could not be serialized.
    #[error("Encoding history")]
    Encode(#[source] serde_json::Error),

    /// The file could not be written.
    #[error("Writing history to {path}")]
    Write {
        /// History file
        path: Utf8PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },
}

/// Combine the summaries on disk with new ones, sorted ascending by date.
///
/// Dates stay unique in the result whatever the policy.
pub fn merge(
    policy: MergePolicy,
    existing: Vec<DailySummary>,
    incoming: Vec<DailySummary>,
) -> Vec<DailySummary> {
    let mut days: BTreeMap<NaiveDate, DailySummary> = BTreeMap::new();

    if !matches!(policy, MergePolicy::Overwrite { .. }) {
        for summary in existing {
            days.entry(summary.date).or_insert(summary);
        }
    }

    for summary in incoming {
        match policy {
            MergePolicy::Append => {
                days.entry(summary.date).or_insert(summary);
            }
            MergePolicy::Overwrite { .. } | MergePolicy::Replace => {
                days.insert(summary.date, summary);
            }
        }
    }

    let mut merged: Vec<DailySummary> = days.into_values().collect();

    if let MergePolicy::Overwrite { limit: Some(limit) } = policy {
        let excess = merged.len().saturating_sub(limit);
        merged.drain(..excess);
    }

    merged
}

/// The history file, and the policy used when saving to it.
#[derive(Debug, Clone)]
pub struct History {
    path: Utf8PathBuf,
    policy: MergePolicy,
}

impl History {
    /// History stored at `path`, updated with `policy`.
    pub fn new(path: impl Into<Utf8PathBuf>, policy: MergePolicy) -> Self {
        Self {
            path: path.into(),
            policy,
        }
    }

    /// Location of the history file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Read the summaries on disk. A missing file is an empty history.
    pub async fn load(&self) -> Result<Vec<DailySummary>, HistoryError> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No history at {}, starting fresh", self.path);
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(HistoryError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&contents).map_err(|source| HistoryError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Merge `incoming` into the file according to the policy, and write it back.
    ///
    /// Returns the records now on disk.
    pub async fn save(
        &self,
        incoming: Vec<DailySummary>,
    ) -> Result<Vec<DailySummary>, HistoryError> {
        let existing = match self.policy {
            MergePolicy::Overwrite { .. } => Vec::new(),
            MergePolicy::Append | MergePolicy::Replace => self.load().await?,
        };
        let before = existing.len();

        let merged = merge(self.policy, existing, incoming);
        let contents = encode(&merged)?;

        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|source| HistoryError::Write {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(
            policy = ?self.policy,
            "Wrote {} days to {} ({} before)",
            merged.len(),
            self.path,
            before
        );
        Ok(merged)
    }
}

fn encode(summaries: &[DailySummary]) -> Result<Vec<u8>, HistoryError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    summaries
        .serialize(&mut serializer)
        .map_err(HistoryError::Encode)?;
    Ok(buf)
}
