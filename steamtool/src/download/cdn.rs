//! CDN rotation for fetching mirror blobs.

use anyhow::Result;

use super::github::RepoInfo;
use super::ManifestDownloader;

/// Pause between full rotations of the CDN list.
const ROUND_DELAY: std::time::Duration = std::time::Duration::from_secs(1);

impl ManifestDownloader<'_> {
    /// Fetches one file through the CDN list.
    ///
    /// Every template is tried once per round; failed rounds repeat after
    /// a short pause. The caller's overall timeout bounds the rotation.
    pub(crate) async fn download_via_cdn(&self, repo: &RepoInfo, path: &str) -> Result<Vec<u8>> {
        let cdns = self.cdn_list();

        loop {
            for template in &cdns {
                let url = fill_template(template, &repo.name, &repo.sha, path);
                match self.ctx.client.get(&url).send().await {
                    Ok(response) if response.status().is_success() => {
                        return Ok(response.bytes().await?.to_vec());
                    }
                    Ok(response) => {
                        debug!("{url} returned {}", response.status());
                    }
                    Err(e) => {
                        debug!("{url} failed: {e}");
                    }
                }
            }
            warn!("all CDNs failed for {path}, retrying");
            tokio::time::sleep(ROUND_DELAY).await;
        }
    }
}

/// Substitutes the `{repo}`, `{sha}` and `{path}` placeholders.
fn fill_template(template: &str, repo: &str, sha: &str, path: &str) -> String {
    template
        .replace("{repo}", repo)
        .replace("{sha}", sha)
        .replace("{path}", path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_raw_githubusercontent() {
        let url = fill_template(
            "https://raw.githubusercontent.com/{repo}/{sha}/{path}",
            "owner/mirror",
            "abc123",
            "key.vdf",
        );
        assert_eq!(
            url,
            "https://raw.githubusercontent.com/owner/mirror/abc123/key.vdf"
        );
    }

    #[test]
    fn test_fill_jsdmirror_uses_at_separator() {
        let url = fill_template(
            "https://cdn.jsdmirror.com/gh/{repo}@{sha}/{path}",
            "owner/mirror",
            "abc123",
            "440900.lua",
        );
        assert_eq!(
            url,
            "https://cdn.jsdmirror.com/gh/owner/mirror@abc123/440900.lua"
        );
    }
}
