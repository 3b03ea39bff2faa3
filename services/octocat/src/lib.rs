//! Client for the parts of the Github REST API which describe a user's
//! repositories and their commit history.

use std::collections::BTreeSet;

use api_client::{ApiClient, BearerAuth, LinkHeader, Paginated, PaginationError, Secret};
use futures::StreamExt as _;
use http::{header, HeaderName, HeaderValue, StatusCode};
use hyperdriver::client::conn::transport::tcp::TcpTransportConfig;
use hyperdriver::Client;
use thiserror::Error;
use tower_http::set_header::SetRequestHeaderLayer;

mod filter;
pub mod models;

pub use crate::filter::{AuthorFilter, NOREPLY_SUFFIX};
use crate::models::{Commit, Repository, Topics};

const CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);
const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_TOPICS_ACCEPT: &str = "application/vnd.github.mercy-preview+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const GITHUB_API_VERSION_HEADER: HeaderName = HeaderName::from_static("x-github-api-version");
const USER_AGENT: &str = concat!("commits-spread/", env!("CARGO_PKG_VERSION"));

/// Default base URI for the Github REST API.
pub const GITHUB_BASE: &str = "https://api.github.com/";

/// Largest page size the commit listing accepts.
pub const COMMITS_PER_PAGE: usize = 100;

/// Errors that can occur when using the Github client.
#[derive(Debug, Error)]
pub enum Error {
    /// Building, sending or reading a request failed.
    #[error("Github API: {0}")]
    Api(#[from] api_client::Error),

    /// A page of a listing failed.
    #[error("Github API: {0}")]
    Pagination(#[from] PaginationError),
}

impl Error {
    /// The HTTP status returned by Github, when the request got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api(error) => error.status(),
            Error::Pagination(error) => error.source.status(),
        }
    }
}

/// Commits authored by one account in one repository.
///
/// When a page fails part way through the listing, `commits` holds whatever
/// was collected before the failure and `error` says what went wrong.
#[derive(Debug)]
pub struct AuthoredCommits {
    /// Matching commits, in the order Github listed them.
    pub commits: Vec<Commit>,

    /// Commits seen before filtering.
    pub seen: usize,

    /// Pages requested.
    pub pages: usize,

    /// The failure which ended the listing early, if any.
    pub error: Option<PaginationError>,
}

/// A Github client authenticated with a pre-issued access token.
///
/// Every request carries the token as a bearer credential, along with the
/// Github `Accept` and API version headers.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: ApiClient<BearerAuth>,
}

impl GithubClient {
    /// Create a client for api.github.com.
    pub fn new<K: Into<Secret>>(token: K) -> Self {
        Self::with_base(
            GITHUB_BASE.parse().expect("GITHUB_BASE is a valid URI"),
            token,
        )
    }

    /// Create a client for the Github API at `base`, such as a Github Enterprise host.
    pub fn with_base<K: Into<Secret>>(base: http::Uri, token: K) -> Self {
        let mut tcp = TcpTransportConfig::default();
        tcp.connect_timeout = Some(CONNECT_TIMEOUT);

        let client = Client::builder()
            .with_tcp(tcp)
            .with_default_tls()
            .with_auto_http()
            .with_user_agent(USER_AGENT.to_owned())
            .with_timeout(TIMEOUT)
            .build_service();

        Self::with_service(base, token, client)
    }

    /// Create a client which sends requests through `service`.
    pub fn with_service<K, S>(base: http::Uri, token: K, service: S) -> Self
    where
        K: Into<Secret>,
        S: tower::Service<
                http::Request<hyperdriver::Body>,
                Response = http::Response<hyperdriver::Body>,
                Error = hyperdriver::client::Error,
            > + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        let service = tower::ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                header::ACCEPT,
                HeaderValue::from_static(GITHUB_ACCEPT),
            ))
            .layer(SetRequestHeaderLayer::if_not_present(
                GITHUB_API_VERSION_HEADER,
                HeaderValue::from_static(GITHUB_API_VERSION),
            ))
            .service(service);

        Self {
            client: ApiClient::new_with_inner_service(base, BearerAuth::new(token), service),
        }
    }

    /// List the repositories visible to the authenticated user.
    ///
    /// Only the first page of the listing is requested, so accounts with more
    /// repositories than fit on one page will see a truncated list.
    #[tracing::instrument(skip(self))]
    pub async fn repositories(&self) -> Result<Vec<Repository>, Error> {
        let response = self
            .client
            .get("user/repos")
            .send()
            .await?
            .error_for_status()
            .await
            .map_err(api_client::Error::Response)?;

        let repositories: Vec<Repository> = response
            .json()
            .await
            .map_err(api_client::Error::ResponseBody)?;

        tracing::debug!("Found {} repositories", repositories.len());
        Ok(repositories)
    }

    /// Topic labels of a repository.
    ///
    /// A repository without topics may answer `404 Not Found`, which is
    /// reported as an empty set.
    #[tracing::instrument(skip(self))]
    pub async fn topics(&self, owner: &str, repository: &str) -> Result<BTreeSet<String>, Error> {
        let response = self
            .client
            .get(&format!("repos/{owner}/{repository}/topics"))
            .header(header::ACCEPT, GITHUB_TOPICS_ACCEPT)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("No topics for {owner}/{repository}");
            return Ok(BTreeSet::new());
        }

        let response = response
            .error_for_status()
            .await
            .map_err(api_client::Error::Response)?;

        let topics: Topics = response
            .json()
            .await
            .map_err(api_client::Error::ResponseBody)?;

        Ok(topics.into_set())
    }

    /// Stream every commit on the default branch of a repository.
    ///
    /// Pages are followed through the `Link` header until the last page, or
    /// until Github returns an empty page.
    pub fn commits(
        &self,
        owner: &str,
        repository: &str,
    ) -> Result<Paginated<BearerAuth, Commit, LinkHeader>, Error> {
        let commits = self
            .client
            .get(&format!("repos/{owner}/{repository}/commits"))
            .query(&[("per_page", COMMITS_PER_PAGE)])?
            .paginate(LinkHeader)?;
        Ok(commits)
    }

    /// Collect the commits of a repository which `filter` attributes to its account.
    ///
    /// A failed page stops the listing but keeps the commits gathered so far,
    /// see [AuthoredCommits].
    #[tracing::instrument(skip(self, filter), fields(login = filter.login()))]
    pub async fn authored_commits(
        &self,
        owner: &str,
        repository: &str,
        filter: &AuthorFilter,
    ) -> Result<AuthoredCommits, Error> {
        let mut stream = self.commits(owner, repository)?;
        let mut commits = Vec::new();
        let mut seen = 0;
        let mut error = None;

        while let Some(item) = stream.next().await {
            match item {
                Ok(commit) => {
                    seen += 1;
                    if filter.matches(&commit) {
                        commits.push(commit);
                    }
                }
                Err(err) => {
                    tracing::warn!("Stopped listing commits for {owner}/{repository}: {err}");
                    error = Some(err);
                    break;
                }
            }
        }

        tracing::debug!(
            pages = stream.pages(),
            "Kept {} of {} commits in {owner}/{repository}",
            commits.len(),
            seen
        );

        Ok(AuthoredCommits {
            commits,
            seen,
            pages: stream.pages(),
            error,
        })
    }
}

#[cfg(test)]
mod tests {
    use api_client::mock::MockService;
    use indoc::indoc;

    use super::*;

    const COMMIT_PAGE_ONE: &str = indoc! {r#"
        [
            {
                "sha": "a1",
                "commit": { "author": { "name": "Octo", "email": "octo@example.com", "date": "2024-05-01T09:00:00Z" }, "message": "one" },
                "author": { "login": "octocat", "id": 1 }
            },
            {
                "sha": "a2",
                "commit": { "author": { "name": "Octo", "email": "octo@example.com", "date": "2024-05-01T12:00:00Z" }, "message": "two" },
                "author": { "login": "octocat", "id": 1 }
            },
            {
                "sha": "a3",
                "commit": { "author": { "name": "Octo", "email": "583231+octocat@users.noreply.github.com", "date": "2024-05-02T08:00:00Z" }, "message": "three" },
                "author": null
            },
            {
                "sha": "b1",
                "commit": { "author": { "name": "Hubot", "email": "hubot@example.com", "date": "2024-05-02T08:30:00Z" }, "message": "four" },
                "author": { "login": "hubot", "id": 2 }
            }
        ]
    "#};

    const COMMIT_PAGE_TWO: &str = indoc! {r#"
        [
            {
                "sha": "a4",
                "commit": { "author": { "name": "Octo", "email": "octo@example.com", "date": "2024-05-03T09:00:00Z" }, "message": "five" },
                "author": { "login": "octocat", "id": 1 }
            }
        ]
    "#};

    fn client(mock: MockService) -> GithubClient {
        GithubClient::with_service(
            "https://api.github.com/".parse().unwrap(),
            "ghp_test",
            mock,
        )
    }

    fn next_link(target: &str) -> http::HeaderMap {
        let mut headers = http::HeaderMap::new();
        headers.insert(
            header::LINK,
            format!("<{target}>; rel=\"next\", <{target}>; rel=\"last\"")
                .parse()
                .unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn list_repositories() {
        let mut mock = MockService::new();
        mock.add_json(
            "/user/repos",
            indoc! {r#"
                [
                    { "name": "hello", "full_name": "octocat/hello", "owner": { "login": "octocat", "id": 1 }, "private": false, "fork": false },
                    { "name": "spoon", "full_name": "acme/spoon", "owner": { "login": "acme", "id": 7 } }
                ]
            "#},
        );

        let github = client(mock.clone());
        let repositories = github.repositories().await.unwrap();
        assert_eq!(repositories.len(), 2);
        assert_eq!(repositories[1].owner.login, "acme");

        let request = &mock.requests()[0];
        assert_eq!(request.headers[header::ACCEPT], GITHUB_ACCEPT);
        assert_eq!(request.headers[GITHUB_API_VERSION_HEADER], GITHUB_API_VERSION);
        assert_eq!(request.headers[header::AUTHORIZATION], "Bearer ghp_test");
    }

    #[tokio::test]
    async fn list_repositories_fails_on_error_status() {
        let mut mock = MockService::new();
        mock.add(
            "/user/repos",
            StatusCode::UNAUTHORIZED,
            http::HeaderMap::new(),
            br#"{"message": "Bad credentials"}"#.to_vec(),
        );

        let error = client(mock).repositories().await.unwrap_err();
        assert_eq!(error.status(), Some(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn topics_use_preview_media_type() {
        let mut mock = MockService::new();
        mock.add_json(
            "/repos/octocat/hello/topics",
            r#"{"names": ["rust", "cli", "rust"]}"#,
        );

        let topics = client(mock.clone())
            .topics("octocat", "hello")
            .await
            .unwrap();
        assert_eq!(
            topics.into_iter().collect::<Vec<_>>(),
            vec!["cli".to_owned(), "rust".to_owned()]
        );

        let request = &mock.requests()[0];
        let accept: Vec<_> = request.headers.get_all(header::ACCEPT).iter().collect();
        assert_eq!(accept, vec![GITHUB_TOPICS_ACCEPT]);
    }

    #[tokio::test]
    async fn topics_not_found_is_empty() {
        let mut mock = MockService::new();
        mock.add(
            "/repos/octocat/hello/topics",
            StatusCode::NOT_FOUND,
            http::HeaderMap::new(),
            br#"{"message": "Not Found"}"#.to_vec(),
        );

        let topics = client(mock).topics("octocat", "hello").await.unwrap();
        assert!(topics.is_empty());
    }

    #[tokio::test]
    async fn topics_server_error_is_an_error() {
        let mut mock = MockService::new();
        mock.add(
            "/repos/octocat/hello/topics",
            StatusCode::INTERNAL_SERVER_ERROR,
            http::HeaderMap::new(),
            b"oops".to_vec(),
        );

        let error = client(mock).topics("octocat", "hello").await.unwrap_err();
        assert_eq!(error.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn authored_commits_follow_pages_and_filter() {
        let mut mock = MockService::new();
        mock.add(
            "/repos/octocat/hello/commits?per_page=100",
            StatusCode::OK,
            next_link("https://api.github.com/repositories/1/commits?per_page=100&page=2"),
            COMMIT_PAGE_ONE.as_bytes().to_vec(),
        );
        mock.add_json(
            "/repositories/1/commits?per_page=100&page=2",
            COMMIT_PAGE_TWO,
        );

        let filter = AuthorFilter::new("octocat", None);
        let authored = client(mock.clone())
            .authored_commits("octocat", "hello", &filter)
            .await
            .unwrap();

        let shas: Vec<_> = authored.commits.iter().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, vec!["a1", "a2", "a3", "a4"]);
        assert_eq!(authored.seen, 5);
        assert_eq!(authored.pages, 2);
        assert!(authored.error.is_none());
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn authored_commits_keep_partial_results() {
        let mut mock = MockService::new();
        mock.add(
            "/repos/octocat/hello/commits?per_page=100",
            StatusCode::OK,
            next_link("https://api.github.com/repositories/1/commits?per_page=100&page=2"),
            COMMIT_PAGE_ONE.as_bytes().to_vec(),
        );
        mock.fail("/repositories/1/commits?per_page=100&page=2");

        let filter = AuthorFilter::new("octocat", None);
        let authored = client(mock)
            .authored_commits("octocat", "hello", &filter)
            .await
            .unwrap();

        assert_eq!(authored.commits.len(), 3);
        let error = authored.error.expect("second page fails");
        assert_eq!(error.page, 2);
    }
}
