//! Read-only GitHub REST snapshot client
//!
//! Projects can link a repository; we cache a small snapshot of it (stars,
//! forks, languages, recent commits) on the project entity and refresh it
//! only when the cached copy is older than [`CACHE_MAX_AGE_MINUTES`].

use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{now_iso, GitHubCommit, GitHubRepoData};

const GITHUB_API_BASE: &str = "https://api.github.com";

/// How long a cached snapshot stays fresh.
pub const CACHE_MAX_AGE_MINUTES: i64 = 30;

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("Not a GitHub repository URL: {0}")]
    InvalidUrl(String),
    #[error("GitHub request failed: {0}")]
    Request(#[from] Box<ureq::Error>),
    #[error("Failed to parse GitHub response: {0}")]
    Parse(#[from] std::io::Error),
}

/// Extract `owner/repo` from the URL shapes users paste in: full https URLs,
/// `.git` suffixed clones, or a bare `owner/repo`.
pub fn parse_repo_url(url: &str) -> Option<(String, String)> {
    let patterns = [
        r"github\.com/([^/]+)/([^/]+?)(?:\.git)?(?:/.*)?$",
        r"^([^/\s]+)/([^/\s]+)$",
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).expect("static regex");
        if let Some(caps) = re.captures(url) {
            let owner = caps[1].to_string();
            let repo = caps[2].trim_end_matches(".git").to_string();
            return Some((owner, repo));
        }
    }
    None
}

/// Whether a cached snapshot needs refreshing. Missing or unparseable
/// `fetchedAt` counts as stale.
pub fn is_stale(data: Option<&GitHubRepoData>) -> bool {
    let Some(data) = data else { return true };
    let Ok(fetched) = chrono::DateTime::parse_from_rfc3339(&data.fetched_at) else {
        return true;
    };
    let age = chrono::Utc::now().signed_duration_since(fetched);
    age > chrono::Duration::minutes(CACHE_MAX_AGE_MINUTES)
}

// Wire shapes for the three REST calls; only the fields we keep.

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    watchers_count: u64,
    language: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    open_issues_count: u64,
    #[serde(default)]
    pushed_at: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    updated_at: String,
}

#[derive(Debug, Default, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    sha: String,
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    commit: CommitDetail,
    author: Option<CommitAccount>,
}

#[derive(Debug, Default, Deserialize)]
struct CommitDetail {
    #[serde(default)]
    message: String,
    author: Option<CommitSignature>,
}

#[derive(Debug, Default, Deserialize)]
struct CommitSignature {
    name: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitAccount {
    login: String,
}

fn map_commit(c: CommitResponse) -> GitHubCommit {
    let sha: String = c.sha.chars().take(7).collect();
    let message = c
        .commit
        .message
        .lines()
        .next()
        .unwrap_or_default()
        .to_string();
    let signature = c.commit.author.unwrap_or_default();
    let author = signature
        .name
        .or(c.author.map(|a| a.login))
        .unwrap_or_else(|| "Unknown".to_string());
    GitHubCommit {
        sha,
        message,
        author,
        date: signature.date.unwrap_or_default(),
        url: c.html_url,
    }
}

fn assemble_snapshot(
    repo: RepoResponse,
    languages: BTreeMap<String, u64>,
    commits: Vec<CommitResponse>,
) -> GitHubRepoData {
    GitHubRepoData {
        name: repo.name,
        description: repo.description,
        stars: repo.stargazers_count,
        forks: repo.forks_count,
        watchers: repo.watchers_count,
        language: repo.language,
        languages,
        topics: repo.topics,
        open_issues: repo.open_issues_count,
        last_push: repo.pushed_at,
        created_at: repo.created_at,
        updated_at: repo.updated_at,
        recent_commits: commits.into_iter().map(map_commit).collect(),
        fetched_at: now_iso(),
    }
}

fn get(url: &str, token: Option<&str>) -> ureq::Request {
    let req = ureq::get(url).set("Accept", "application/vnd.github.v3+json");
    match token {
        Some(token) => req.set("Authorization", &format!("Bearer {}", token)),
        None => req,
    }
}

/// Fetch a fresh snapshot of a repository. The repo call must succeed;
/// languages and commits degrade to empty when their calls fail, since the
/// snapshot is still useful without them.
pub fn fetch_snapshot(
    github_url: &str,
    token: Option<&str>,
) -> Result<GitHubRepoData, GitHubError> {
    let (owner, repo) = parse_repo_url(github_url)
        .ok_or_else(|| GitHubError::InvalidUrl(github_url.to_string()))?;
    let base = format!("{}/repos/{}/{}", GITHUB_API_BASE, owner, repo);

    let repo_data: RepoResponse = get(&base, token).call().map_err(Box::new)?.into_json()?;

    let languages: BTreeMap<String, u64> = get(&format!("{}/languages", base), token)
        .call()
        .ok()
        .and_then(|r| r.into_json().ok())
        .unwrap_or_default();

    let commits: Vec<CommitResponse> = get(&format!("{}/commits?per_page=5", base), token)
        .call()
        .ok()
        .and_then(|r| r.into_json().ok())
        .unwrap_or_default();

    Ok(assemble_snapshot(repo_data, languages, commits))
}
