//! AppID list management and injector AppList generation.
//!
//! AppIDs live in plain-text files under `List/`, one id per line. Files
//! may be grouped by game name; `example.txt` is documentation and is
//! excluded from everything except removal scans.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::appinfo::{self, GameInfo};
use crate::ctx::AppContext;

/// File that plain `add` operations append to.
const DEFAULT_LIST_FILE: &str = "go.txt";

/// Returns `true` for a non-empty all-digit AppID.
pub fn is_valid_app_id(app_id: &str) -> bool {
    !app_id.is_empty() && app_id.bytes().all(|b| b.is_ascii_digit())
}

/// Reads the valid AppIDs out of one list file.
pub fn read_app_ids(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| is_valid_app_id(line))
        .map(str::to_string)
        .collect())
}

/// Collects the `.txt` files under the list directory, recursively.
fn txt_files(dir: &Path, include_example: bool) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect_txt(dir, include_example, &mut files);
    files.sort();
    files
}

fn collect_txt(dir: &Path, include_example: bool, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_txt(&path, include_example, out);
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !name.ends_with(".txt") {
            continue;
        }
        if !include_example && name == "example.txt" {
            continue;
        }
        out.push(path);
    }
}

/// Returns `true` if the id already occurs in any list file.
pub fn app_id_exists(ctx: &AppContext, app_id: &str) -> bool {
    txt_files(&ctx.paths.list_dir(), true)
        .iter()
        .filter_map(|path| read_app_ids(path).ok())
        .any(|ids| ids.iter().any(|id| id == app_id))
}

/// Appends an AppID to `List/go.txt` unless it is already listed somewhere.
pub fn add_app_id(ctx: &AppContext, app_id: &str) -> Result<()> {
    if !is_valid_app_id(app_id) {
        bail!("AppID must be numeric");
    }

    let list_dir = ctx.paths.list_dir();
    fs::create_dir_all(&list_dir)?;

    if app_id_exists(ctx, app_id) {
        println!("⚠️  AppID {app_id} is already listed");
        return Ok(());
    }

    let go_file = list_dir.join(DEFAULT_LIST_FILE);
    let mut file = fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(&go_file)
        .with_context(|| format!("cannot open {}", go_file.display()))?;
    writeln!(file, "{app_id}")?;

    println!("✅ added AppID {app_id}");
    Ok(())
}

/// Prints every list file with its AppIDs.
pub fn show_app_ids(ctx: &AppContext) {
    println!("📋 scanning {} ...", ctx.paths.list_dir().display());

    let mut found = false;
    for path in txt_files(&ctx.paths.list_dir(), false) {
        let Ok(ids) = read_app_ids(&path) else {
            println!("  ❌ cannot read {}", path.display());
            continue;
        };
        if ids.is_empty() {
            continue;
        }
        found = true;
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        println!("✅ {name}");
        for id in ids {
            println!("  {id}");
        }
    }

    if !found {
        println!("📭 no AppIDs found");
    }
}

/// Removes one id from a list file, dropping the file when it empties.
///
/// Returns `true` if the id was present.
fn delete_from_file(path: &Path, app_id: &str) -> bool {
    let Ok(content) = fs::read_to_string(path) else {
        return false;
    };

    let mut kept = Vec::new();
    let mut found = false;
    for line in content.lines().map(str::trim) {
        if line == app_id {
            found = true;
            continue;
        }
        if !line.is_empty() {
            kept.push(line);
        }
    }

    if !found {
        return false;
    }

    if kept.is_empty() {
        let _ = fs::remove_file(path);
        return true;
    }

    let mut body = kept.join("\n");
    body.push('\n');
    fs::write(path, body).is_ok()
}

/// Removes an AppID from every list file it occurs in.
pub fn remove_app_id(ctx: &AppContext, app_id: &str) -> Result<()> {
    if !is_valid_app_id(app_id) {
        bail!("AppID must be numeric");
    }

    let mut found = false;
    for path in txt_files(&ctx.paths.list_dir(), true) {
        if delete_from_file(&path, app_id) {
            println!("✅ removed AppID {app_id} from {}", path.display());
            found = true;
        }
    }

    if !found {
        println!("❌ AppID {app_id} not found");
    }
    Ok(())
}

/// Replaces Windows-invalid filename characters and caps the length.
fn sanitize_file_name(name: &str) -> String {
    let mut result: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\\' | '/' => '_',
            other => other,
        })
        .collect();
    if result.len() > 100 {
        let cut = (0..=100).rev().find(|&i| result.is_char_boundary(i)).unwrap_or(0);
        result.truncate(cut);
    }
    result.trim().to_string()
}

/// Groups listed AppIDs into `<GameName>.txt` files.
///
/// Each id's display name is resolved through the appinfo API; DLC ids
/// whose parent app is also listed are grouped under the parent's name.
/// Ids that moved are scrubbed from the other list files.
pub async fn organize(ctx: &AppContext) -> Result<()> {
    println!("📋 organizing AppIDs ...");

    let list_dir = ctx.paths.list_dir();
    let mut all_ids = BTreeSet::new();
    for path in txt_files(&list_dir, false) {
        if let Ok(ids) = read_app_ids(&path) {
            all_ids.extend(ids);
        }
    }

    if all_ids.is_empty() {
        println!("📭 no AppIDs found");
        return Ok(());
    }

    // game name -> ids, with parent lookups cached across DLCs
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut parent_cache: HashMap<String, GameInfo> = HashMap::new();

    for app_id in &all_ids {
        let Some(info) = appinfo::game_info(ctx, app_id).await else {
            println!("  {app_id} - lookup failed");
            continue;
        };

        let target_name = match &info.parent {
            Some(parent_id) if all_ids.contains(parent_id) => {
                let parent = match parent_cache.get(parent_id) {
                    Some(cached) => cached.clone(),
                    None => {
                        let fetched = appinfo::game_info(ctx, parent_id)
                            .await
                            .unwrap_or_else(|| info.clone());
                        parent_cache.insert(parent_id.clone(), fetched.clone());
                        fetched
                    }
                };
                if parent.name.is_empty() {
                    info.name.clone()
                } else {
                    parent.name
                }
            }
            _ => info.name.clone(),
        };

        let file_name = sanitize_file_name(&target_name);
        if file_name.is_empty() {
            println!("  {app_id} - lookup failed");
            continue;
        }
        groups.entry(file_name).or_default().push(app_id.clone());
    }

    for (file_name, ids) in &groups {
        let target = list_dir.join(format!("{file_name}.txt"));
        let mut body = ids.join("\n");
        body.push('\n');
        if let Err(e) = fs::write(&target, body) {
            println!("❌ cannot write {}: {e}", target.display());
            continue;
        }

        println!("✅ {file_name}.txt");
        for id in ids {
            println!("  {id}");
        }

        // Scrub the moved ids from every other list file.
        let target_name = format!("{file_name}.txt");
        for path in txt_files(&list_dir, false) {
            if path.file_name().is_some_and(|n| n.to_string_lossy() == target_name) {
                continue;
            }
            for id in ids {
                delete_from_file(&path, id);
            }
        }
    }

    Ok(())
}

/// Regenerates the injector's AppList directory from the list files.
///
/// The directory is cleared and rebuilt with one `<index>.txt` file per
/// unique id. Related depot ids recorded in the per-app manifest
/// directory (`<appid>/<appid>.txt`) are appended after their app.
pub fn generate_app_list(ctx: &AppContext) -> Result<()> {
    let app_list_dir = ctx.paths.app_list_dir();

    if app_list_dir.exists() {
        fs::remove_dir_all(&app_list_dir)
            .with_context(|| format!("cannot clear {}", app_list_dir.display()))?;
    }
    fs::create_dir_all(&app_list_dir)?;

    let mut added: BTreeSet<String> = BTreeSet::new();
    let mut index = 0usize;

    let mut write_entry = |app_id: &str, index: &mut usize| -> Result<()> {
        let path = app_list_dir.join(format!("{index}.txt"));
        fs::write(&path, format!("{app_id}\n"))
            .with_context(|| format!("cannot write {}", path.display()))?;
        println!("  {app_id}");
        *index += 1;
        Ok(())
    };

    for path in txt_files(&ctx.paths.list_dir(), false) {
        let Ok(ids) = read_app_ids(&path) else {
            continue;
        };
        if !ids.is_empty() {
            let name = path.file_name().unwrap_or_default().to_string_lossy();
            println!("✅ {name}");
        }

        for app_id in ids {
            if !added.insert(app_id.clone()) {
                continue;
            }
            write_entry(&app_id, &mut index)?;

            // Depot ids recorded when the manifest bundle was processed.
            let related = ctx.paths.app_dir(&app_id).join(format!("{app_id}.txt"));
            if let Ok(related_ids) = read_app_ids(&related) {
                for related_id in related_ids {
                    if added.insert(related_id.clone()) {
                        write_entry(&related_id, &mut index)?;
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ctx(root: &Path) -> AppContext {
        AppContext::with_root(root.to_path_buf()).unwrap()
    }

    #[test]
    fn test_is_valid_app_id() {
        assert!(is_valid_app_id("440900"));
        assert!(!is_valid_app_id(""));
        assert!(!is_valid_app_id("44a900"));
        assert!(!is_valid_app_id("-440900"));
    }

    #[test]
    fn test_add_and_exists() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());

        add_app_id(&ctx, "123").unwrap();
        assert!(app_id_exists(&ctx, "123"));
        assert!(!app_id_exists(&ctx, "456"));

        let ids = read_app_ids(&ctx.paths.list_dir().join("go.txt")).unwrap();
        assert_eq!(ids, vec!["123"]);
    }

    #[test]
    fn test_add_rejects_non_numeric() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        assert!(add_app_id(&ctx, "abc").is_err());
    }

    #[test]
    fn test_remove_drops_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());

        add_app_id(&ctx, "123").unwrap();
        remove_app_id(&ctx, "123").unwrap();
        assert!(!ctx.paths.list_dir().join("go.txt").exists());
    }

    #[test]
    fn test_remove_keeps_other_ids() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());

        add_app_id(&ctx, "1").unwrap();
        add_app_id(&ctx, "2").unwrap();
        remove_app_id(&ctx, "1").unwrap();

        let ids = read_app_ids(&ctx.paths.list_dir().join("go.txt")).unwrap();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Half-Life: Alyx"), "Half-Life_ Alyx");
        assert_eq!(sanitize_file_name("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_file_name("  plain  "), "plain");
    }

    #[test]
    fn test_generate_app_list_dedups_and_indexes() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());

        let list_dir = ctx.paths.list_dir();
        fs::create_dir_all(&list_dir).unwrap();
        fs::write(list_dir.join("a.txt"), "10\n20\n").unwrap();
        fs::write(list_dir.join("b.txt"), "20\n30\n").unwrap();

        generate_app_list(&ctx).unwrap();

        let app_list = ctx.paths.app_list_dir();
        let ids: Vec<String> = (0..3)
            .map(|i| {
                fs::read_to_string(app_list.join(format!("{i}.txt")))
                    .unwrap()
                    .trim()
                    .to_string()
            })
            .collect();
        assert_eq!(ids, vec!["10", "20", "30"]);
        assert!(!app_list.join("3.txt").exists());
    }

    #[test]
    fn test_generate_app_list_pulls_related_depots() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());

        fs::create_dir_all(ctx.paths.list_dir()).unwrap();
        fs::write(ctx.paths.list_dir().join("go.txt"), "10\n").unwrap();

        let app_dir = ctx.paths.app_dir("10");
        fs::create_dir_all(&app_dir).unwrap();
        fs::write(app_dir.join("10.txt"), "11\n12\n").unwrap();

        generate_app_list(&ctx).unwrap();

        let app_list = ctx.paths.app_list_dir();
        for (i, id) in ["10", "11", "12"].iter().enumerate() {
            let body = fs::read_to_string(app_list.join(format!("{i}.txt"))).unwrap();
            assert_eq!(body.trim(), *id);
        }
    }
}
