//! Attributing commits to a Github account.

use crate::models::Commit;

/// Domain of the anonymized addresses Github hands out to hide a user's email.
pub const NOREPLY_SUFFIX: &str = "@users.noreply.github.com";

/// Selects the commits authored by one Github account.
///
/// Authorship shows up in three ways: the commit is linked to the account,
/// the author email is one of the account's no-reply addresses, or the
/// author email is a known real address. A commit matching any of these is
/// kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorFilter {
    login: String,
    email: Option<String>,
}

impl AuthorFilter {
    /// Match commits from `login`, and from `email` when one is given.
    pub fn new(login: impl Into<String>, email: Option<String>) -> Self {
        Self {
            login: login.into(),
            email: email.filter(|email| !email.is_empty()),
        }
    }

    /// The account login this filter matches.
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Whether `commit` was authored by this account.
    pub fn matches(&self, commit: &Commit) -> bool {
        if commit.login() == Some(self.login.as_str()) {
            return true;
        }

        let Some(email) = commit.email() else {
            return false;
        };

        if email.ends_with(NOREPLY_SUFFIX) && email.contains(self.login.as_str()) {
            return true;
        }

        self.email.as_deref() == Some(email)
    }
}
