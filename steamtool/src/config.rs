//! Tool configuration types.
//!
//! Configuration lives in `steamtool.toml` next to the executable's
//! working directory. Every field has a sensible default and a missing or
//! unreadable file falls back to the defaults, so a bare checkout works
//! without any setup.
//!
//! # Configuration File Format
//!
//! ```toml
//! create_app_manifest = true
//! add_app_id_to_list = true
//! manifest_cookie = ""
//! github_token = ""
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default browser-like User-Agent for endpoints that reject bare clients.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

/// The file name the configuration is loaded from.
pub const CONFIG_FILE: &str = "steamtool.toml";

/// Tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolConfig {
    /// Whether to write `appmanifest_<appid>.acf` into `steamapps/`.
    pub create_app_manifest: bool,
    /// Whether to append processed AppIDs to `List/go.txt`.
    pub add_app_id_to_list: bool,
    /// Session cookie for the manifest API. Empty disables that path.
    pub manifest_cookie: String,
    /// User-Agent header sent on every request.
    pub user_agent: String,
    /// GitHub API token. Empty falls back to the `GITHUB_TOKEN` env var.
    pub github_token: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            create_app_manifest: true,
            add_app_id_to_list: true,
            manifest_cookie: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            github_token: String::new(),
        }
    }
}

impl ToolConfig {
    /// Loads the configuration from the given directory.
    ///
    /// A missing file is normal and yields the defaults; a malformed file
    /// is logged and likewise yields the defaults rather than aborting.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        let Ok(content) = std::fs::read_to_string(&path) else {
            debug!("no {CONFIG_FILE}, using defaults");
            return Self::default();
        };

        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("failed to parse {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Returns the GitHub token, falling back to the environment.
    pub fn github_token(&self) -> Option<String> {
        if !self.github_token.is_empty() {
            return Some(self.github_token.clone());
        }
        std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ToolConfig::default();
        assert!(config.create_app_manifest);
        assert!(config.add_app_id_to_list);
        assert!(config.manifest_cookie.is_empty());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: ToolConfig = toml::from_str("create_app_manifest = false\n").unwrap();
        assert!(!config.create_app_manifest);
        assert!(config.add_app_id_to_list);
        assert_eq!(config.user_agent, ToolConfig::default().user_agent);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ToolConfig::load(dir.path()), ToolConfig::default());
    }
}
