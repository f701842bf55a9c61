//! Steam installation surfaces.
//!
//! Locates the Steam client through the registry, patches depot
//! decryption keys into `config.vdf` (with a timestamped backup first),
//! copies manifests into the depotcache, optionally generates an
//! appmanifest, and drives the injector binaries.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use colored::Colorize;
use keyvdf::{DepotKey, Node};

use crate::applist;
use crate::appinfo;
use crate::ctx::AppContext;

/// Registry locations holding the Steam install path, in query order.
const STEAM_REG_KEYS: &[(&str, &str)] = &[
    (r"HKCU\Software\Valve\Steam", "SteamPath"),
    (r"HKLM\SOFTWARE\WOW6432Node\Valve\Steam", "InstallPath"),
];

/// Section of `config.vdf` that holds the decryption keys.
const DEPOTS_SECTION: &str = "depots";

/// Resolves the Steam install directory from the registry.
///
/// The per-user key is tried first, then the machine-wide one.
///
/// # Errors
///
/// Fails when `reg query` is unavailable (non-Windows hosts) or no
/// location yields a value.
pub fn steam_root(ctx: &AppContext) -> Result<PathBuf> {
    for (key, value) in STEAM_REG_KEYS {
        let output = ctx
            .command("reg", &ctx.paths.root)
            .args(["query", key, "/v", value])
            .output()
            .context("cannot run reg query, is this a Windows host?")?;
        if !output.status.success() {
            continue;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(path) = parse_reg_sz(&stdout, value) {
            return Ok(PathBuf::from(path));
        }
    }
    bail!("Steam install path not found in the registry")
}

/// Pulls the REG_SZ payload out of `reg query` output.
///
/// The value line looks like `    SteamPath    REG_SZ    c:/steam`, with
/// whitespace-separated columns and the path possibly containing spaces.
fn parse_reg_sz(output: &str, value_name: &str) -> Option<String> {
    for line in output.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with(value_name) {
            continue;
        }
        let (_, rest) = trimmed.split_once("REG_SZ")?;
        let value = rest.trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

/// Whether a bundle directory carries anything keys can be read from.
pub fn has_key_files(dir: &Path) -> bool {
    collect_key_source(dir).is_some()
}

/// What a bundle offers as its key source.
enum KeySource {
    /// First Lua unlock script, sorted by name.
    Lua(PathBuf),
    /// A `key.vdf` file.
    KeyVdf(PathBuf),
}

/// Finds the preferred key source in a bundle directory.
fn collect_key_source(dir: &Path) -> Option<KeySource> {
    let mut luas: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("lua"))
        })
        .collect();
    luas.sort();
    if let Some(lua) = luas.into_iter().next() {
        return Some(KeySource::Lua(lua));
    }

    let key_vdf = dir.join("key.vdf");
    if key_vdf.is_file() {
        return Some(KeySource::KeyVdf(key_vdf));
    }
    None
}

/// Reads the depot keys out of a bundle directory.
fn read_depot_keys(dir: &Path) -> Result<Vec<DepotKey>> {
    let source = collect_key_source(dir)
        .with_context(|| format!("no Lua script or key.vdf in {}", dir.display()))?;

    let keys = match source {
        KeySource::Lua(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            keyvdf::extract_depot_keys(&text)
        }
        KeySource::KeyVdf(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            DepotKey::from_key_vdf(&keyvdf::parse(&text))
        }
    };

    if keys.is_empty() {
        bail!("key source in {} yielded no depot keys", dir.display());
    }
    Ok(keys)
}

/// Copies `config.vdf` into the backup directory with a second stamp.
fn backup_config(ctx: &AppContext, config_path: &Path) -> Result<()> {
    let backup_dir = ctx.paths.backup_dir();
    std::fs::create_dir_all(&backup_dir)?;

    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let backup_path = backup_dir.join(format!("config_{secs}.vdf"));
    std::fs::copy(config_path, &backup_path)
        .with_context(|| format!("cannot back up to {}", backup_path.display()))?;
    debug!("backed up config.vdf to {}", backup_path.display());
    Ok(())
}

/// Installs the depot keys of one downloaded bundle into Steam.
///
/// Reads the keys from the bundle, backs up and patches `config.vdf`,
/// records the depot ids next to the bundle, copies manifests into the
/// depotcache, and (per config) generates an appmanifest and registers
/// the AppID in the list files. The patched document is only written
/// when the edit succeeded; a failed edit leaves `config.vdf` untouched.
pub async fn install_keys(ctx: &AppContext, app_id: &str) -> Result<()> {
    let app_dir = ctx.paths.app_dir(app_id);
    let keys = read_depot_keys(&app_dir)?;
    println!("🔑 installing {} depot keys for AppID {app_id}", keys.len());

    let root = steam_root(ctx)?;
    let config_path = root.join("config").join("config.vdf");
    let document = std::fs::read_to_string(&config_path)
        .with_context(|| format!("cannot read {}", config_path.display()))?;

    backup_config(ctx, &config_path)?;

    let patched = keyvdf::upsert_depot_keys(&document, DEPOTS_SECTION, &keys)
        .context("config.vdf left unmodified")?;
    std::fs::write(&config_path, patched)
        .with_context(|| format!("cannot write {}", config_path.display()))?;

    write_depot_list(&app_dir, app_id, &keys)?;
    let copied = copy_manifests(&app_dir, &root)?;
    if copied > 0 {
        println!("📄 copied {copied} manifests into the depotcache");
    }

    if ctx.config.create_app_manifest {
        if let Err(e) = write_app_manifest(ctx, &root, app_id).await {
            warn!("appmanifest generation skipped: {e}");
        }
    }
    if ctx.config.add_app_id_to_list && !applist::app_id_exists(ctx, app_id) {
        applist::add_app_id(ctx, app_id)?;
    }

    println!("{}", "✅ depot keys installed".green());
    Ok(())
}

/// Records the bundle's depot ids, one per line, next to the bundle.
fn write_depot_list(app_dir: &Path, app_id: &str, keys: &[DepotKey]) -> Result<()> {
    let mut text = String::new();
    for key in keys {
        text.push_str(&key.id);
        text.push('\n');
    }
    let path = app_dir.join(format!("{app_id}.txt"));
    std::fs::write(&path, text).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

/// Copies the bundle's `*.manifest` files into Steam's depotcache.
fn copy_manifests(app_dir: &Path, steam_root: &Path) -> Result<usize> {
    let depotcache = steam_root.join("depotcache");
    std::fs::create_dir_all(&depotcache)?;

    let mut copied = 0;
    for entry in std::fs::read_dir(app_dir)?.flatten() {
        let path = entry.path();
        let is_manifest = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("manifest"));
        if !path.is_file() || !is_manifest {
            continue;
        }
        if let Some(name) = path.file_name() {
            std::fs::copy(&path, depotcache.join(name))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Generates a minimal `appmanifest_<appid>.acf` in steamapps.
///
/// The install directory comes from the appinfo API; without it the
/// manifest is not worth writing.
async fn write_app_manifest(ctx: &AppContext, steam_root: &Path, app_id: &str) -> Result<()> {
    let install_dir = appinfo::install_dir(ctx, app_id)
        .await
        .with_context(|| format!("no install dir known for AppID {app_id}"))?;

    let mut state = BTreeMap::new();
    state.insert("appid".to_string(), Node::Value(app_id.to_string()));
    state.insert("Universe".to_string(), Node::Value("1".to_string()));
    state.insert("installdir".to_string(), Node::Value(install_dir));
    state.insert("StateFlags".to_string(), Node::Value("4".to_string()));

    let mut root = BTreeMap::new();
    root.insert("AppState".to_string(), Node::Section(state));

    let steamapps = steam_root.join("steamapps");
    std::fs::create_dir_all(&steamapps)?;
    let path = steamapps.join(format!("appmanifest_{app_id}.acf"));
    std::fs::write(&path, Node::Section(root).serialize(0))
        .with_context(|| format!("cannot write {}", path.display()))?;
    println!("📝 wrote {}", path.display());
    Ok(())
}

/// Points the injector's ini at the resolved Steam executable.
///
/// Only the `Exe` line naming `steam.exe` is rewritten; every other line
/// is preserved as-is.
fn update_injector_ini(ctx: &AppContext, steam_root: &Path) -> Result<()> {
    let ini_path = ctx.paths.injector_dir().join("DLLInjector.ini");
    let text = std::fs::read_to_string(&ini_path)
        .with_context(|| format!("cannot read {}", ini_path.display()))?;

    let steam_exe = steam_root.join("steam.exe");
    let mut lines = Vec::new();
    for line in text.lines() {
        let is_exe_line = line.trim_start().starts_with("Exe")
            && line.to_ascii_lowercase().contains("steam.exe");
        if is_exe_line {
            lines.push(format!("Exe = {}", steam_exe.display()));
        } else {
            lines.push(line.to_string());
        }
    }

    std::fs::write(&ini_path, lines.join("\r\n") + "\r\n")
        .with_context(|| format!("cannot write {}", ini_path.display()))?;
    Ok(())
}

/// Stops Steam, regenerates the AppList and starts the injector.
pub fn launch(ctx: &AppContext) -> Result<()> {
    // A non-running Steam makes taskkill fail, which is fine.
    let _ = ctx
        .command("taskkill", &ctx.paths.root)
        .args(["/F", "/IM", "steam.exe"])
        .output();

    applist::generate_app_list(ctx)?;

    let root = steam_root(ctx)?;
    update_injector_ini(ctx, &root)?;

    let injector_dir = ctx.paths.injector_dir();
    ctx.command("DLLInjector.exe", &injector_dir)
        .spawn()
        .context("cannot start DLLInjector.exe")?;
    println!("{}", "🚀 injector started".green());
    Ok(())
}

/// Runs the bundled app-cache cleaner.
pub fn clear_cache(ctx: &AppContext) -> Result<()> {
    let injector_dir = ctx.paths.injector_dir();
    let status = ctx
        .command("DeleteSteamAppCache.exe", &injector_dir)
        .status()
        .context("cannot start DeleteSteamAppCache.exe")?;
    if !status.success() {
        bail!("app cache cleaner exited with {status}");
    }
    println!("{}", "✅ app cache cleared".green());
    Ok(())
}
