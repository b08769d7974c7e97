//! GitHub REST source.
//!
//! Resolves the branch head, lists the recursive tree, then downloads each text
//! blob in raw form. Nothing touches the disk.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::RemoteSource;
use crate::ai::TimeoutConfig;
use crate::config::SourceConfig;
use crate::constants::source as source_constants;
use crate::types::{Result, ScribeError, SourceError};

/// Token environment variables, in priority order
const TOKEN_VARS: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN"];

/// Extensions never downloaded
const BINARY_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".ico", ".pdf", ".zip", ".tar", ".gz", ".exe", ".dll",
    ".so", ".dylib", ".bin",
];

/// Blob downloads in flight at once
const BLOB_CONCURRENCY: usize = 8;

const USER_AGENT: &str = concat!("reposcribe/", env!("CARGO_PKG_VERSION"));

/// `owner/repo` pair parsed from a locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl RepoSlug {
    /// Accepts `https://github.com/o/r[.git][/...]`, `git@github.com:o/r.git`
    /// and bare `o/r`.
    pub fn parse(locator: &str) -> std::result::Result<Self, SourceError> {
        let trimmed = locator.trim().trim_end_matches('/');
        let invalid = || SourceError::InvalidLocator(locator.to_string());

        let path = if let Some(rest) = trimmed.strip_prefix("git@github.com:") {
            rest.to_string()
        } else if trimmed.contains("://") {
            let url = url::Url::parse(trimmed).map_err(|_| invalid())?;
            if url.host_str() != Some("github.com") && url.host_str() != Some("www.github.com") {
                return Err(invalid());
            }
            url.path().trim_start_matches('/').to_string()
        } else if let Some(rest) = trimmed
            .strip_prefix("github.com/")
            .or_else(|| trimmed.strip_prefix("www.github.com/"))
        {
            rest.to_string()
        } else {
            trimmed.to_string()
        };

        let mut parts = path.split('/').filter(|p| !p.is_empty());
        let owner = parts.next().ok_or_else(invalid)?;
        let repo = parts.next().ok_or_else(invalid)?;
        let repo = repo.strip_suffix(".git").unwrap_or(repo);

        let valid = |s: &str| {
            !s.is_empty()
                && s
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !valid(owner) || !valid(repo) {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

fn is_binary_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    BINARY_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Map a non-success status onto a [`SourceError`]
fn status_error(status: StatusCode, context: &str) -> SourceError {
    match status {
        StatusCode::NOT_FOUND => SourceError::NotFound(context.to_string()),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimited(format!(
            "{} ({}). Set GITHUB_TOKEN or try again later",
            context, status
        )),
        _ => SourceError::Transport(format!("{} ({})", context, status)),
    }
}

fn transport_error(err: reqwest::Error) -> SourceError {
    SourceError::Transport(err.to_string())
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    commit: CommitRef,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    size: Option<u64>,
}

/// GitHub REST client
pub struct GithubSource {
    client: reqwest::Client,
    api_base: String,
    token: Option<SecretString>,
}

impl std::fmt::Debug for GithubSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubSource")
            .field("api_base", &self.api_base)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl GithubSource {
    pub fn from_config(config: &SourceConfig, timeouts: &TimeoutConfig) -> Result<Self> {
        let token = TOKEN_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok())
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from);
        Self::new(&config.github_api_base, timeouts, token)
    }

    /// Requests are bounded by `timeouts.source_request`, connects by
    /// `timeouts.connection`
    pub fn new(
        api_base: &str,
        timeouts: &TimeoutConfig,
        token: Option<SecretString>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeouts.source_request)
            .connect_timeout(timeouts.connection)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ScribeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn get(&self, url: &str, accept: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(url)
            .header("Accept", accept)
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        context: &str,
    ) -> std::result::Result<T, SourceError> {
        let response = self
            .get(url, "application/vnd.github+json")
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(status_error(response.status(), context));
        }
        response.json::<T>().await.map_err(transport_error)
    }

    async fn branch_head(
        &self,
        slug: &RepoSlug,
        branch: &str,
    ) -> std::result::Result<String, SourceError> {
        let url = format!("{}/repos/{}/branches/{}", self.api_base, slug, branch);
        let context = format!("branch '{}' of {}", branch, slug);
        self.get_json::<BranchResponse>(&url, &context)
            .await
            .map(|b| b.commit.sha)
    }

    /// Head commit of `branch`. When the requested branch is `main` or `master`
    /// and missing, the other conventional defaults are tried.
    async fn resolve_commit(
        &self,
        slug: &RepoSlug,
        branch: &str,
    ) -> std::result::Result<(String, String), SourceError> {
        match self.branch_head(slug, branch).await {
            Ok(sha) => return Ok((branch.to_string(), sha)),
            Err(SourceError::NotFound(_)) if matches!(branch, "main" | "master") => {}
            Err(e) => return Err(e),
        }

        for alternative in source_constants::FALLBACK_BRANCHES {
            if *alternative == branch {
                continue;
            }
            debug!("Branch '{}' not found, trying '{}'", branch, alternative);
            match self.branch_head(slug, alternative).await {
                Ok(sha) => {
                    info!("Using branch '{}' instead of '{}'", alternative, branch);
                    return Ok((alternative.to_string(), sha));
                }
                Err(SourceError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(SourceError::NotFound(format!(
            "Branch '{}' not found in {}",
            branch, slug
        )))
    }

    async fn fetch_blob(
        &self,
        slug: &RepoSlug,
        item: &TreeItem,
    ) -> std::result::Result<Option<String>, SourceError> {
        let url = format!("{}/repos/{}/git/blobs/{}", self.api_base, slug, item.sha);
        let response = self
            .get(&url, "application/vnd.github.raw+json")
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(status_error(response.status(), &item.path));
        }
        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(String::from_utf8(bytes.to_vec()).ok())
    }
}

#[async_trait]
impl RemoteSource for GithubSource {
    #[instrument(skip(self), fields(source = "github"))]
    async fn fetch(
        &self,
        locator: &str,
        branch: Option<&str>,
    ) -> std::result::Result<BTreeMap<String, String>, SourceError> {
        let slug = RepoSlug::parse(locator)?;
        let requested = branch.unwrap_or("main");
        let (branch, sha) = self.resolve_commit(&slug, requested).await?;

        let tree_url = format!(
            "{}/repos/{}/git/trees/{}?recursive=1",
            self.api_base, slug, sha
        );
        let tree: TreeResponse = self
            .get_json(&tree_url, &format!("tree of {}@{}", slug, branch))
            .await?;
        if tree.truncated {
            warn!("GitHub truncated the tree for {}; some files are missing", slug);
        }

        let blobs: Vec<TreeItem> = tree
            .tree
            .into_iter()
            .filter(|item| item.kind == "blob")
            .filter(|item| {
                if is_binary_path(&item.path) {
                    debug!("Skipping binary file: {}", item.path);
                    return false;
                }
                if item.size.unwrap_or(0) > source_constants::MAX_BLOB_SIZE {
                    debug!("Skipping large file: {} ({:?} bytes)", item.path, item.size);
                    return false;
                }
                true
            })
            .collect();

        info!("Downloading {} files from {}@{}", blobs.len(), slug, branch);

        let slug = &slug;
        let fetches: Vec<_> = blobs
            .iter()
            .map(|item| async move { (item, self.fetch_blob(slug, item).await) })
            .collect();
        let results: Vec<_> = stream::iter(fetches)
            .buffer_unordered(BLOB_CONCURRENCY)
            .collect()
            .await;

        let mut files = BTreeMap::new();
        for (item, result) in results {
            match result {
                Ok(Some(text)) => {
                    files.insert(item.path.clone(), text);
                }
                Ok(None) => debug!("Could not decode as UTF-8: {}", item.path),
                Err(e @ SourceError::RateLimited(_)) => return Err(e),
                Err(e) => warn!("Failed to download {}: {}", item.path, e),
            }
        }

        info!("Downloaded {} text files", files.len());
        Ok(files)
    }

    fn name(&self) -> &str {
        "github"
    }
}
