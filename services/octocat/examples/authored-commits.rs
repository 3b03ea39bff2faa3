//! List the commits in one repository authored by a Github account.
//!
//! ```sh
//! GITHUB_TOKEN=... cargo run -p octocat --example authored-commits -- octocat hello-world octocat
//! ```

use api_client::Secret;
use eyre::{eyre, WrapErr as _};
use octocat::{AuthorFilter, GithubClient};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let (Some(owner), Some(repository), Some(login)) = (args.next(), args.next(), args.next())
    else {
        return Err(eyre!("usage: authored-commits <owner> <repository> <login>"));
    };

    let token = Secret::from_env("GITHUB_TOKEN").wrap_err("GITHUB_TOKEN is not set")?;
    let github = GithubClient::new(token);

    let filter = AuthorFilter::new(login, std::env::var("GITHUB_EMAIL").ok());
    let authored = github
        .authored_commits(&owner, &repository, &filter)
        .await?;

    for commit in &authored.commits {
        let summary = commit.commit.message.lines().next().unwrap_or_default();
        println!("{} {} {summary}", commit.day(), commit.sha);
    }

    if let Some(error) = authored.error {
        return Err(error).wrap_err("listing stopped early");
    }

    Ok(())
}
