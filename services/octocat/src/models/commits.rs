//! Commit data models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Account;

/// A commit object, as returned by the commit listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    /// The SHA of the commit.
    pub sha: String,

    /// The commit details.
    pub commit: CommitDetails,

    /// The Github account linked to the commit author, when Github could match one.
    #[serde(default)]
    pub author: Option<Account>,
}

impl Commit {
    /// Login of the Github account which authored this commit.
    pub fn login(&self) -> Option<&str> {
        self.author.as_ref().map(|account| account.login.as_str())
    }

    /// Email recorded in the commit author field.
    pub fn email(&self) -> Option<&str> {
        self.commit.author.email.as_deref()
    }

    /// Calendar day (UTC) on which the commit was authored.
    pub fn day(&self) -> NaiveDate {
        self.commit.author.date.date_naive()
    }
}

/// The author and message for a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetails {
    /// The author of the commit.
    pub author: AuthorCommitDetails,
    /// The commit message.
    #[serde(default)]
    pub message: String,
}

/// The author and date for a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorCommitDetails {
    /// Author name
    #[serde(default)]
    pub name: String,
    /// Author email
    #[serde(default)]
    pub email: Option<String>,
    /// The date of the commit.
    pub date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_without_linked_account() {
        let commit: Commit = serde_json::from_str(indoc::indoc! {r#"
            {
                "sha": "6377dc6de44e3557bfc1d0b186581d442a77f774",
                "commit": {
                    "author": {
                        "name": "Octo Cat",
                        "email": "octo@example.com",
                        "date": "2024-03-01T23:59:59Z"
                    },
                    "message": "Initial commit"
                },
                "author": null
            }
        "#})
        .unwrap();

        assert_eq!(commit.login(), None);
        assert_eq!(commit.email(), Some("octo@example.com"));
        assert_eq!(commit.day(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn commit_day_is_utc() {
        let commit: Commit = serde_json::from_str(indoc::indoc! {r#"
            {
                "sha": "abc",
                "commit": {
                    "author": { "name": "Octo", "date": "2024-03-01T23:30:00-02:00" }
                },
                "author": { "login": "octocat", "id": 1 }
            }
        "#})
        .unwrap();

        assert_eq!(commit.login(), Some("octocat"));
        assert_eq!(commit.email(), None);
        assert_eq!(commit.day(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }
}
