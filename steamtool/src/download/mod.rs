//! Manifest acquisition for one AppID.
//!
//! Bundles are obtained, in order of preference:
//!
//! 1. A `<appid>*.zip` dropped next to the tool (no network at all)
//! 2. The cookie-gated manifest API (when a cookie is configured)
//! 3. Mirrored GitHub repositories, one branch per AppID, with the file
//!    blobs fetched through a rotating CDN list
//!
//! Whatever the source, the bundle ends up under
//! `utils/ManifestHub/<appid>/` and the depot keys are installed from
//! there.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::applist;
use crate::ctx::AppContext;
use crate::steam;

/// Cookie-gated manifest API client.
pub mod api;

/// Zip bundle handling: local intake and extraction.
pub mod archive;

/// CDN template substitution and retry rotation (internal).
mod cdn;

/// GitHub branch/tree API access and version caching.
pub mod github;

/// Mirror repositories carrying one branch per AppID.
const MIRROR_REPOS: &[&str] = &[
    "ehgen0ng/ManifestHub",
    "SteamAutoCracks/ManifestHub",
    "Auiowu/ManifestAutoUpdate",
    "tymolu233/ManifestAutoUpdate-fix",
];

/// CDN URL templates preferred inside mainland China.
const CN_CDNS: &[&str] = &[
    "https://cdn.jsdmirror.com/gh/{repo}@{sha}/{path}",
    "https://raw.gitmirror.com/{repo}/{sha}/{path}",
    "https://raw.dgithub.xyz/{repo}/{sha}/{path}",
    "https://gh.akass.cn/{repo}/{sha}/{path}",
];

/// CDN URL templates preferred everywhere else.
const GLOBAL_CDNS: &[&str] = &["https://raw.githubusercontent.com/{repo}/{sha}/{path}"];

/// Overall budget for the GitHub acquisition path.
const GITHUB_BUDGET: Duration = Duration::from_secs(120);

/// Probe target for the region check.
const REGION_PROBE: &str = "google.com:80";
const REGION_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Downloads manifest bundles and hands them to key installation.
pub struct ManifestDownloader<'a> {
    pub(crate) ctx: &'a AppContext,
    /// Whether the CN CDN list is preferred.
    pub(crate) is_cn: bool,
}

impl<'a> ManifestDownloader<'a> {
    /// Creates a downloader, probing which CDN list to prefer.
    pub async fn new(ctx: &'a AppContext) -> Self {
        let is_cn = detect_region().await;
        debug!("region probe: is_cn={is_cn}");
        Self { ctx, is_cn }
    }

    /// Runs one acquisition pass.
    ///
    /// Local zip bundles are consumed first. Otherwise the AppID (from the
    /// argument or an interactive prompt) is fetched via the manifest API
    /// when a cookie is configured, falling back to the GitHub mirrors.
    /// On success the depot keys are installed into the Steam client.
    pub async fn run(&self, app_id: Option<&str>) -> Result<()> {
        if self.consume_local_zips().await? {
            return Ok(());
        }

        let app_id = match app_id {
            Some(id) => id.to_string(),
            None => prompt_app_id()?,
        };
        if !applist::is_valid_app_id(&app_id) {
            bail!("AppID must be numeric");
        }

        match self.try_manifest_api(&app_id).await {
            Ok(true) => {
                steam::install_keys(self.ctx, &app_id).await?;
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => println!("❌ manifest API download failed: {e}"),
        }

        tokio::time::timeout(GITHUB_BUDGET, self.download_from_github(&app_id))
            .await
            .map_err(|_| anyhow!("GitHub download timed out"))??;

        steam::install_keys(self.ctx, &app_id).await?;
        Ok(())
    }

    /// Processes zip bundles dropped into the working directory.
    ///
    /// Returns `true` when a bundle was consumed (the pass is done).
    async fn consume_local_zips(&self) -> Result<bool> {
        for zip_path in archive::find_local_zips(&self.ctx.paths.root)? {
            let Some(app_id) = archive::app_id_from_zip_name(&zip_path) else {
                continue;
            };

            let app_dir = self.ctx.paths.app_dir(&app_id);
            if archive::extract_zip(&zip_path, &app_dir).is_err() {
                continue;
            }
            if !steam::has_key_files(&app_dir) {
                continue;
            }

            println!(
                "🎯 processing local bundle: {} (AppID: {app_id})",
                zip_path.file_name().unwrap_or_default().to_string_lossy()
            );
            if steam::install_keys(self.ctx, &app_id).await.is_err() {
                continue;
            }

            let _ = std::fs::remove_file(&zip_path);
            return Ok(true);
        }
        Ok(false)
    }

    /// Fetches the bundle from the freshest GitHub mirror.
    async fn download_from_github(&self, app_id: &str) -> Result<()> {
        let repo = self.find_latest_repo(app_id).await?;

        let app_dir = self.ctx.paths.app_dir(app_id);
        std::fs::create_dir_all(&app_dir)
            .with_context(|| format!("cannot create {}", app_dir.display()))?;

        self.download_all_files(app_id, &repo).await
    }

    /// Builds the CDN template list in preference order.
    pub(crate) fn cdn_list(&self) -> Vec<&'static str> {
        let mut list = Vec::new();
        if self.is_cn {
            list.extend_from_slice(CN_CDNS);
            list.extend_from_slice(GLOBAL_CDNS);
        } else {
            list.extend_from_slice(GLOBAL_CDNS);
            list.extend_from_slice(CN_CDNS);
        }
        list
    }
}

/// Checks whether the global CDNs look reachable.
///
/// An unreachable probe means the CN mirror list goes first. The probe is
/// a plain TCP dial with a short timeout; any error counts as CN.
async fn detect_region() -> bool {
    let connect = tokio::net::TcpStream::connect(REGION_PROBE);
    match tokio::time::timeout(REGION_PROBE_TIMEOUT, connect).await {
        Ok(Ok(_)) => false,
        _ => true,
    }
}

/// Prompts for an AppID on stdin.
fn prompt_app_id() -> Result<String> {
    print!("{}", "Enter the AppID: ".bold());
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let app_id = input.trim().to_string();
    if app_id.is_empty() {
        bail!("AppID must not be empty");
    }
    Ok(app_id)
}
