//! GitHub branch and tree lookups for the manifest mirrors.
//!
//! Each mirror repository carries one branch per AppID. The branch API
//! yields the commit date (for picking the freshest mirror) and the tree
//! SHA, and the tree API yields the file blobs to fetch through the CDNs.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use super::{ManifestDownloader, MIRROR_REPOS};

/// Name of the version stamp written into each downloaded bundle.
const VERSION_FILE: &str = ".version";

/// Pause between retries of a failed branch lookup.
const RETRY_DELAY: std::time::Duration = std::time::Duration::from_secs(1);

/// The mirror chosen for one AppID, as persisted in [`VERSION_FILE`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoInfo {
    /// `owner/name` of the mirror repository.
    pub name: String,
    /// Commit date of the AppID branch, RFC 3339 UTC.
    pub last_update: String,
    /// Tree SHA the bundle was fetched from.
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct BranchInfo {
    pub commit: BranchCommit,
}

#[derive(Debug, Deserialize)]
pub struct BranchCommit {
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
pub struct CommitDetail {
    pub author: CommitAuthor,
    pub tree: TreeRef,
}

#[derive(Debug, Deserialize)]
pub struct CommitAuthor {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct TreeRef {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct TreeResponse {
    pub tree: Vec<TreeItem>,
}

#[derive(Debug, Deserialize)]
pub struct TreeItem {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ManifestDownloader<'_> {
    /// Queries one mirror for the AppID branch.
    ///
    /// A 404 means the mirror does not carry the AppID and fails the call.
    /// Transient failures are retried until the caller's budget runs out.
    async fn branch_info(&self, repo: &str, app_id: &str) -> Result<BranchInfo> {
        let url = format!("https://api.github.com/repos/{repo}/branches/{app_id}");
        loop {
            let mut request = self.ctx.client.get(&url);
            if let Some(token) = self.ctx.config.github_token() {
                request = request.bearer_auth(token);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    debug!("branch lookup {url} failed: {e}, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            match response.status().as_u16() {
                200 => return Ok(response.json().await?),
                404 => bail!("{repo} has no branch for AppID {app_id}"),
                status => {
                    debug!("branch lookup {url} returned {status}, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    /// Lists the file blobs of a tree, minus the mirror's readme.
    async fn file_list(&self, repo: &str, tree_sha: &str) -> Result<Vec<TreeItem>> {
        let url = format!("https://api.github.com/repos/{repo}/git/trees/{tree_sha}?recursive=1");
        let mut request = self.ctx.client.get(&url);
        if let Some(token) = self.ctx.config.github_token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            bail!("tree lookup for {repo} returned {}", response.status());
        }

        let tree: TreeResponse = response.json().await?;
        Ok(tree
            .tree
            .into_iter()
            .filter(|item| item.kind == "blob" && !item.path.eq_ignore_ascii_case("readme.md"))
            .collect())
    }

    /// Picks the mirror with the freshest commit for the AppID.
    ///
    /// Commit dates are RFC 3339 UTC, so string comparison orders them.
    pub(crate) async fn find_latest_repo(&self, app_id: &str) -> Result<RepoInfo> {
        let mut latest: Option<RepoInfo> = None;

        for repo in MIRROR_REPOS {
            let info = match self.branch_info(repo, app_id).await {
                Ok(info) => info,
                Err(e) => {
                    debug!("{e}");
                    continue;
                }
            };

            let candidate = RepoInfo {
                name: repo.to_string(),
                last_update: info.commit.commit.author.date,
                sha: info.commit.commit.tree.sha,
            };
            let newer = latest
                .as_ref()
                .is_none_or(|best| candidate.last_update > best.last_update);
            if newer {
                latest = Some(candidate);
            }
        }

        latest.with_context(|| format!("no mirror carries AppID {app_id}"))
    }

    /// Fetches every blob of the chosen mirror into the bundle directory.
    ///
    /// When the local version stamp already matches the mirror's tree SHA,
    /// files present on disk are kept and only missing ones are fetched.
    pub(crate) async fn download_all_files(&self, app_id: &str, repo: &RepoInfo) -> Result<()> {
        let app_dir = self.ctx.paths.app_dir(app_id);

        let needs_update = match load_version(&app_dir) {
            Some(local) => local.sha != repo.sha,
            None => true,
        };

        let files = self.file_list(&repo.name, &repo.sha).await?;
        if files.is_empty() {
            bail!("{} has an empty tree for AppID {app_id}", repo.name);
        }

        println!(
            "📦 downloading {} files from {}",
            files.len(),
            repo.name.cyan()
        );
        let bar = indicatif::ProgressBar::new(files.len() as u64);

        let mut fetched = 0usize;
        for item in &files {
            let target = app_dir.join(&item.path);
            if !needs_update && target.exists() {
                bar.inc(1);
                continue;
            }

            let bytes = self.download_via_cdn(repo, &item.path).await?;
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, bytes)
                .with_context(|| format!("cannot write {}", target.display()))?;
            fetched += 1;
            bar.inc(1);
        }
        bar.finish_and_clear();

        save_version(&app_dir, repo)?;
        println!("✅ bundle ready ({fetched} fetched, {} total)", files.len());
        Ok(())
    }
}

/// Reads the version stamp of a bundle directory, if any.
fn load_version(app_dir: &Path) -> Option<RepoInfo> {
    let text = std::fs::read_to_string(app_dir.join(VERSION_FILE)).ok()?;
    serde_json::from_str(&text).ok()
}

/// Writes the version stamp of a bundle directory.
fn save_version(app_dir: &Path, repo: &RepoInfo) -> Result<()> {
    let text = serde_json::to_string_pretty(repo)?;
    std::fs::write(app_dir.join(VERSION_FILE), text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_stamp_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = RepoInfo {
            name: "owner/mirror".to_string(),
            last_update: "2025-06-01T12:00:00Z".to_string(),
            sha: "abc123".to_string(),
        };
        save_version(dir.path(), &repo).unwrap();

        let loaded = load_version(dir.path()).unwrap();
        assert_eq!(loaded.name, "owner/mirror");
        assert_eq!(loaded.sha, "abc123");
    }

    #[test]
    fn test_missing_version_stamp() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_version(dir.path()).is_none());
    }

    #[test]
    fn test_rfc3339_dates_order_as_strings() {
        assert!("2025-06-01T12:00:00Z" > "2025-05-31T23:59:59Z");
        assert!("2024-12-31T00:00:00Z" < "2025-01-01T00:00:00Z");
    }
}
