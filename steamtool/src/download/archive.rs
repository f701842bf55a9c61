//! Zip bundle intake and extraction.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

/// Leading digit run of a bundle file name, e.g. `440900_depots.zip`.
static LEADING_APP_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)").unwrap());

/// Lists zip files sitting directly in `dir`, sorted by name.
pub fn find_local_zips(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut zips = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(zips),
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_zip = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        if path.is_file() && is_zip {
            zips.push(path);
        }
    }
    zips.sort();
    Ok(zips)
}

/// Reads the AppID off the front of a bundle file name.
pub fn app_id_from_zip_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let captures = LEADING_APP_ID.captures(stem)?;
    Some(captures[1].to_string())
}

/// Extracts a zip into `target`, refusing entries that escape it.
pub fn extract_zip(zip_path: &Path, target: &Path) -> Result<()> {
    let file = File::open(zip_path)
        .with_context(|| format!("cannot open {}", zip_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("{} is not a zip archive", zip_path.display()))?;

    std::fs::create_dir_all(target)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            bail!("{} contains an unsafe path", zip_path.display());
        };
        let out_path = target.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)
            .with_context(|| format!("cannot create {}", out_path.display()))?;
        std::io::copy(&mut entry, &mut out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_app_id_from_zip_name() {
        assert_eq!(
            app_id_from_zip_name(Path::new("440900.zip")).as_deref(),
            Some("440900")
        );
        assert_eq!(
            app_id_from_zip_name(Path::new("440900_depots.zip")).as_deref(),
            Some("440900")
        );
        assert!(app_id_from_zip_name(Path::new("notes.zip")).is_none());
    }

    #[test]
    fn test_find_local_zips_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("440900.zip"), b"x").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub.zip")).unwrap();

        let zips = find_local_zips(dir.path()).unwrap();
        assert_eq!(zips.len(), 1);
        assert!(zips[0].ends_with("440900.zip"));
    }

    #[test]
    fn test_find_local_zips_missing_dir() {
        let zips = find_local_zips(Path::new("/nonexistent/path")).unwrap();
        assert!(zips.is_empty());
    }

    #[test]
    fn test_extract_zip_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("440900.zip");

        let file = File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("key.vdf", options).unwrap();
        writer.write_all(b"\"depots\"\n{\n}\n").unwrap();
        writer.start_file("nested/441001.manifest", options).unwrap();
        writer.write_all(b"data").unwrap();
        writer.finish().unwrap();

        let target = dir.path().join("out");
        extract_zip(&zip_path, &target).unwrap();

        assert!(target.join("key.vdf").is_file());
        assert!(target.join("nested/441001.manifest").is_file());
    }
}
