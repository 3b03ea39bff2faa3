//! Configuration read from the process environment.

use camino::Utf8PathBuf;
use octocat::AuthorFilter;
use secret::Secret;
use thiserror::Error;

use crate::history::{MergePolicy, DEFAULT_HISTORY_FILE};

/// Access token for the Github API.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";
/// Login of the account whose commits are counted.
pub const USERNAME_VAR: &str = "GITHUB_USERNAME";
/// Name of the repository running the collection. Read, but not used.
pub const REPOSITORY_VAR: &str = "REPO_NAME";
/// An extra email address which identifies the account's commits.
pub const EMAIL_VAR: &str = "GITHUB_EMAIL";
/// Where the history file lives.
pub const HISTORY_FILE_VAR: &str = "COMMIT_HISTORY_FILE";
/// `append`, `overwrite` or `replace`.
pub const MERGE_VAR: &str = "COMMIT_HISTORY_MERGE";
/// Days kept by the `overwrite` policy.
pub const LIMIT_VAR: &str = "COMMIT_HISTORY_LIMIT";
/// Base URI of the Github REST API.
pub const API_URL_VAR: &str = "GITHUB_API_URL";

/// The configuration is incomplete or invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("Missing environment variable {0}")]
    Missing(&'static str),

    /// A variable is set to a value which cannot be used.
    #[error("Invalid value {value:?} for {var}: {reason}")]
    Invalid {
        /// The variable
        var: &'static str,
        /// Its value
        value: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Everything a collection run needs to know.
#[derive(Debug, Clone)]
pub struct Config {
    /// Github access token.
    pub token: Secret,

    /// Account login used to attribute commits.
    pub login: String,

    /// The repository running the collection, if given.
    pub repository: Option<String>,

    /// Fallback email used to attribute commits.
    pub email: Option<String>,

    /// History file location.
    pub history_file: Utf8PathBuf,

    /// How new summaries are merged into the history file.
    pub merge_policy: MergePolicy,

    /// Github API base.
    pub api_base: http::Uri,
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to its value.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let token = Secret::from(get(TOKEN_VAR).ok_or(ConfigError::Missing(TOKEN_VAR))?);
        if let Err(error) = token.bearer() {
            return Err(ConfigError::Invalid {
                var: TOKEN_VAR,
                value: "****".into(),
                reason: format!("not usable in an Authorization header: {error}"),
            });
        }

        let login = get(USERNAME_VAR).ok_or(ConfigError::Missing(USERNAME_VAR))?;

        let merge_policy = match get(MERGE_VAR) {
            None => MergePolicy::default(),
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "append" => MergePolicy::Append,
                "replace" => MergePolicy::Replace,
                "overwrite" => MergePolicy::Overwrite {
                    limit: get(LIMIT_VAR).map(parse_limit).transpose()?,
                },
                _ => {
                    return Err(ConfigError::Invalid {
                        var: MERGE_VAR,
                        value,
                        reason: "expected one of append, overwrite, replace".into(),
                    })
                }
            },
        };

        if !matches!(merge_policy, MergePolicy::Overwrite { .. }) && get(LIMIT_VAR).is_some() {
            tracing::warn!("{LIMIT_VAR} only applies to the overwrite policy, ignoring it");
        }

        let api_base: http::Uri = match get(API_URL_VAR) {
            None => octocat::GITHUB_BASE
                .parse()
                .expect("GITHUB_BASE is a valid URI"),
            Some(value) => value.parse().map_err(|error: http::uri::InvalidUri| {
                ConfigError::Invalid {
                    var: API_URL_VAR,
                    reason: error.to_string(),
                    value,
                }
            })?,
        };

        Ok(Config {
            token,
            login,
            repository: get(REPOSITORY_VAR),
            email: get(EMAIL_VAR),
            history_file: get(HISTORY_FILE_VAR)
                .map(Utf8PathBuf::from)
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_HISTORY_FILE)),
            merge_policy,
            api_base,
        })
    }

    /// The filter which attributes commits to the configured account.
    pub fn author_filter(&self) -> AuthorFilter {
        AuthorFilter::new(self.login.clone(), self.email.clone())
    }
}

/// The limit is only read, and only checked, for the `overwrite` policy.
fn parse_limit(value: String) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(limit) if limit > 0 => Ok(limit),
        Ok(_) => Err(ConfigError::Invalid {
            var: LIMIT_VAR,
            value,
            reason: "must be at least 1".into(),
        }),
        Err(error) => Err(ConfigError::Invalid {
            var: LIMIT_VAR,
            reason: error.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn minimal_configuration() {
        let config =
            Config::from_lookup(lookup(&[(TOKEN_VAR, "ghp_x"), (USERNAME_VAR, "octocat")]))
                .unwrap();

        assert_eq!(config.token.revealed(), "ghp_x");
        assert_eq!(config.login, "octocat");
        assert_eq!(config.repository, None);
        assert_eq!(config.email, None);
        assert_eq!(config.history_file, DEFAULT_HISTORY_FILE);
        assert_eq!(config.merge_policy, MergePolicy::Append);
        assert_eq!(config.api_base.to_string(), "https://api.github.com/");
    }

    #[test]
    fn missing_token() {
        let error = Config::from_lookup(lookup(&[(USERNAME_VAR, "octocat")])).unwrap_err();
        assert!(matches!(error, ConfigError::Missing(TOKEN_VAR)));

        let error = Config::from_lookup(lookup(&[(TOKEN_VAR, " "), (USERNAME_VAR, "octocat")]))
            .unwrap_err();
        assert!(matches!(error, ConfigError::Missing(TOKEN_VAR)));
    }

    #[test]
    fn missing_username() {
        let error = Config::from_lookup(lookup(&[(TOKEN_VAR, "ghp_x")])).unwrap_err();
        assert!(matches!(error, ConfigError::Missing(USERNAME_VAR)));
        assert_eq!(
            error.to_string(),
            "Missing environment variable GITHUB_USERNAME"
        );
    }

    #[test]
    fn overwrite_with_limit() {
        let config = Config::from_lookup(lookup(&[
            (TOKEN_VAR, "ghp_x"),
            (USERNAME_VAR, "octocat"),
            (MERGE_VAR, "Overwrite"),
            (LIMIT_VAR, "70"),
            (HISTORY_FILE_VAR, "data/history.json"),
            (EMAIL_VAR, "octo@example.com"),
            (REPOSITORY_VAR, "commits-spread"),
        ]))
        .unwrap();

        assert_eq!(
            config.merge_policy,
            MergePolicy::Overwrite { limit: Some(70) }
        );
        assert_eq!(config.history_file, "data/history.json");
        assert_eq!(config.repository.as_deref(), Some("commits-spread"));
        assert_eq!(
            config.author_filter(),
            AuthorFilter::new("octocat", Some("octo@example.com".into()))
        );
    }

    #[test]
    fn invalid_values() {
        let base = [(TOKEN_VAR, "ghp_x"), (USERNAME_VAR, "octocat")];

        let vars = [base[0], base[1], (MERGE_VAR, "sometimes")];
        let error = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(error, ConfigError::Invalid { var: MERGE_VAR, .. }));

        let vars = [base[0], base[1], (MERGE_VAR, "overwrite"), (LIMIT_VAR, "0")];
        let error = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(error, ConfigError::Invalid { var: LIMIT_VAR, .. }));

        let vars = [base[0], base[1], (MERGE_VAR, "overwrite"), (LIMIT_VAR, "many")];
        let error = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(error, ConfigError::Invalid { var: LIMIT_VAR, .. }));
    }

    #[test]
    fn limit_ignored_unless_overwriting() {
        for policy in ["append", "replace"] {
            let vars = [
                (TOKEN_VAR, "ghp_x"),
                (USERNAME_VAR, "octocat"),
                (MERGE_VAR, policy),
                (LIMIT_VAR, "many"),
            ];
            let config = Config::from_lookup(lookup(&vars)).unwrap();
            assert!(!matches!(config.merge_policy, MergePolicy::Overwrite { .. }));
        }
    }

    #[test]
    fn token_with_control_characters() {
        let vars = [(TOKEN_VAR, "ghp_abc\n"), (USERNAME_VAR, "octocat")];
        let error = Config::from_lookup(lookup(&vars)).unwrap_err();

        assert!(matches!(error, ConfigError::Invalid { var: TOKEN_VAR, .. }));
        assert!(!error.to_string().contains("ghp_abc"));
    }
}
