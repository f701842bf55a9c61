//! Cookie-gated manifest API client.
//!
//! The API sits behind a login, so every call carries the session cookie
//! from the config file. An expired session does not return an error
//! status, it returns the login page, so responses that look like HTML
//! count as failures.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use colored::Colorize;
use regex::Regex;
use serde::Deserialize;

use super::{archive, ManifestDownloader};
use crate::steam;

const API_BASE: &str = "https://manifest.morrenus.xyz";

/// Characters kept verbatim in downloaded file names.
static SAFE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9._-]").unwrap());

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    games: Vec<GameEntry>,
}

#[derive(Debug, Deserialize)]
struct GameEntry {
    appid: u64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct PrepareResponse {
    #[serde(default)]
    success: bool,
    token: Option<String>,
    filename: Option<String>,
    message: Option<String>,
}

impl ManifestDownloader<'_> {
    /// Downloads a bundle through the manifest API.
    ///
    /// Returns `Ok(false)` when no session cookie is configured, so the
    /// caller falls through to the GitHub mirrors without noise.
    pub(crate) async fn try_manifest_api(&self, app_id: &str) -> Result<bool> {
        let cookie = self.ctx.config.manifest_cookie.trim();
        if cookie.is_empty() {
            return Ok(false);
        }

        let game = self.search_game(cookie, app_id).await?;
        println!("🔍 found {} (AppID: {})", game.name.cyan(), game.appid);

        let prepared = self.prepare_download(cookie, app_id).await?;
        let token = prepared
            .token
            .context("prepare response carried no token")?;
        let filename = prepared
            .filename
            .unwrap_or_else(|| format!("{app_id}.zip"));

        self.fetch_bundle(cookie, app_id, &token, &filename).await?;
        Ok(true)
    }

    /// Confirms the API knows the AppID.
    async fn search_game(&self, cookie: &str, app_id: &str) -> Result<GameEntry> {
        let url = format!("{API_BASE}/api/games?search={app_id}");
        let response = self
            .ctx
            .client
            .get(&url)
            .header("Cookie", cookie)
            .header("Accept", "application/json")
            .send()
            .await?;

        let body = response.text().await?;
        ensure_not_login_page(&body)?;

        let search: SearchResponse =
            serde_json::from_str(&body).context("search response is not JSON")?;
        search
            .games
            .into_iter()
            .find(|g| g.appid.to_string() == app_id)
            .with_context(|| format!("manifest API has no entry for AppID {app_id}"))
    }

    /// Requests a one-time download token.
    async fn prepare_download(&self, cookie: &str, app_id: &str) -> Result<PrepareResponse> {
        let url = format!("{API_BASE}/download/prepare/{app_id}");
        let response = self
            .ctx
            .client
            .post(&url)
            .header("Cookie", cookie)
            .header("Accept", "application/json")
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let body = response.text().await?;
        ensure_not_login_page(&body)?;

        let prepared: PrepareResponse =
            serde_json::from_str(&body).context("prepare response is not JSON")?;
        if !prepared.success {
            bail!(
                "prepare failed: {}",
                prepared.message.unwrap_or_else(|| "no reason given".into())
            );
        }
        Ok(prepared)
    }

    /// Downloads the zip, extracts it and removes the archive.
    async fn fetch_bundle(
        &self,
        cookie: &str,
        app_id: &str,
        token: &str,
        filename: &str,
    ) -> Result<()> {
        let url = format!("{API_BASE}/download/{app_id}?token={token}");
        let response = self
            .ctx
            .client
            .get(&url)
            .header("Cookie", cookie)
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("bundle download returned {}", response.status());
        }

        let bytes = response.bytes().await?;
        if bytes.len() < 1024 {
            warn!("bundle is only {} bytes, likely an error body", bytes.len());
        }

        let zip_path = self.ctx.paths.root.join(safe_file_name(filename));
        std::fs::write(&zip_path, &bytes)
            .with_context(|| format!("cannot write {}", zip_path.display()))?;

        let app_dir = self.ctx.paths.app_dir(app_id);
        let extracted = archive::extract_zip(&zip_path, &app_dir);
        let _ = std::fs::remove_file(&zip_path);
        extracted?;

        if !steam::has_key_files(&app_dir) {
            bail!("bundle for AppID {app_id} carries no key files");
        }
        println!("✅ bundle downloaded via manifest API");
        Ok(())
    }
}

/// Rejects responses that are the login page instead of JSON.
fn ensure_not_login_page(body: &str) -> Result<()> {
    let head = body.trim_start();
    if head.starts_with("<!DOCTYPE") || head.starts_with("<html") {
        bail!("manifest API returned a login page, session cookie expired");
    }
    Ok(())
}

/// Replaces everything outside `[a-zA-Z0-9._-]` with underscores.
fn safe_file_name(name: &str) -> String {
    SAFE_NAME.replace_all(name, "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("440900.zip"), "440900.zip");
        assert_eq!(safe_file_name("My Game (v2).zip"), "My_Game__v2_.zip");
    }

    #[test]
    fn test_login_page_detected() {
        assert!(ensure_not_login_page("<!DOCTYPE html><html>").is_err());
        assert!(ensure_not_login_page("  <html lang=\"en\">").is_err());
        assert!(ensure_not_login_page(r#"{"games":[]}"#).is_ok());
    }

    #[test]
    fn test_search_response_decodes() {
        let json = r#"{"games":[{"appid":440900,"name":"Conan Exiles"}]}"#;
        let search: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(search.games.len(), 1);
        assert_eq!(search.games[0].appid, 440900);
    }
}
