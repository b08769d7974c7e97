//! Input acquisition: remote repositories and uploaded archives.

mod archive;
mod github;

pub use archive::decode_zip;
pub use github::{GithubSource, RepoSlug};

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::types::SourceError;

/// Fetches a repository's text files into memory
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Download `locator` at `branch` (default branch when `None`) as a
    /// path → content map. Binary and oversized files are left out.
    async fn fetch(
        &self,
        locator: &str,
        branch: Option<&str>,
    ) -> Result<BTreeMap<String, String>, SourceError>;

    /// Source name for logging
    fn name(&self) -> &str;
}

pub type SharedSource = Arc<dyn RemoteSource>;
