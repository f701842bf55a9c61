//! Application context and state management.
//!
//! This module provides the [`AppContext`] type which holds the global
//! state for steamtool: the on-disk directory layout, the loaded
//! configuration and the shared HTTP client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ToolConfig;

/// On-disk directory layout, rooted at the tool's working directory.
#[derive(Debug, Clone)]
pub struct PathLayout {
    /// Root working directory.
    pub root: PathBuf,
}

impl PathLayout {
    /// Directory holding the plain-text AppID list files.
    pub fn list_dir(&self) -> PathBuf {
        self.root.join("List")
    }

    /// Directory holding downloaded manifest bundles, one per AppID.
    pub fn hub_dir(&self) -> PathBuf {
        self.root.join("utils").join("ManifestHub")
    }

    /// Manifest bundle directory for one AppID.
    pub fn app_dir(&self, app_id: &str) -> PathBuf {
        self.hub_dir().join(app_id)
    }

    /// Directory holding the injector and its helper binaries.
    pub fn injector_dir(&self) -> PathBuf {
        self.root.join("utils").join("GreenLuma")
    }

    /// Directory of generated one-id-per-file AppList entries.
    pub fn app_list_dir(&self) -> PathBuf {
        self.injector_dir().join("AppList")
    }

    /// Backup directory for patched Steam config files.
    pub fn backup_dir(&self) -> PathBuf {
        self.hub_dir().join("backup")
    }
}

/// The main application context holding all state.
///
/// `AppContext` is the central state container for steamtool operations.
/// It manages the directory layout, the loaded [`ToolConfig`] and the
/// shared HTTP client used by every network path.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Directory layout for lists, manifests and the injector.
    pub paths: PathLayout,
    /// Loaded tool configuration.
    pub config: ToolConfig,
    /// Shared HTTP client with the configured User-Agent.
    pub client: reqwest::Client,
}

impl AppContext {
    /// Creates a context rooted at the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be determined or
    /// the HTTP client cannot be constructed.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_root(std::env::current_dir()?)
    }

    /// Creates a context rooted at an explicit directory.
    pub fn with_root(root: PathBuf) -> anyhow::Result<Self> {
        let config = ToolConfig::load(&root);
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            paths: PathLayout { root },
            config,
            client,
        })
    }

    /// Creates a command builder running in the given directory.
    ///
    /// Used for the external Windows surfaces (`reg`, `taskkill`, the
    /// injector binaries).
    pub fn command(&self, program: &str, workdir: &Path) -> std::process::Command {
        let mut cmd = std::process::Command::new(program);
        cmd.current_dir(workdir);
        cmd
    }
}
