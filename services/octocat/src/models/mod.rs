//! Github API object models.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub mod commits;

pub use commits::Commit;

/// A Github user or organization account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Account login.
    pub login: String,

    /// Account ID.
    #[serde(default)]
    pub id: u64,
}

/// A repository visible to the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// Repository name, without the owner.
    pub name: String,

    /// `owner/name`
    #[serde(default)]
    pub full_name: String,

    /// Account which owns the repository.
    pub owner: Account,

    /// Whether the repository is private.
    #[serde(default)]
    pub private: bool,

    /// Whether the repository is a fork.
    #[serde(default)]
    pub fork: bool,
}

/// Response from the repository topics endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Topics {
    /// Topic labels, in the order Github reports them.
    #[serde(default)]
    pub names: Vec<String>,
}

impl Topics {
    /// The topics as a set, dropping any duplicates.
    pub fn into_set(self) -> BTreeSet<String> {
        self.names.into_iter().collect()
    }
}
