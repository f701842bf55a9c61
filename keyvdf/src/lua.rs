//! Depot key extraction from Lua unlock scripts.
//!
//! The alternate source format is a flat script of call statements,
//! one per line:
//!
//! ```text
//! -- generated 2024-03-01
//! addappid(440900)
//! addappid(440901, 1, "AB12CD34EF")
//! ```
//!
//! Only calls carrying both a numeric first argument and a quoted hex
//! final argument yield a record; everything else (comments, calls
//! without a key, unrelated statements) is skipped silently.

use std::sync::LazyLock;

use regex::Regex;

use crate::record::DepotKey;

// name(numericId[, 0|1], "hexSecret")
static KEY_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[A-Za-z_][A-Za-z0-9_]*\((\d+)(?:,\s*[01])?,\s*"([a-fA-F0-9]+)"\)"#).unwrap()
});

/// Extracts depot keys from Lua unlock-script text.
///
/// Records appear in source-line order; duplicate ids are not
/// deduplicated here, callers that need uniqueness keep their own map.
/// This never fails: text with no matching lines yields an empty list.
pub fn extract_depot_keys(text: &str) -> Vec<DepotKey> {
    let mut records = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("--") {
            continue;
        }

        if let Some(caps) = KEY_CALL.captures(line) {
            records.push(DepotKey::new(&caps[1], &caps[2]));
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_id_and_secret() {
        let records = extract_depot_keys("foo(440900, 1, \"AB12CD34EF\")\n");
        assert_eq!(records, vec![DepotKey::new("440900", "AB12CD34EF")]);
    }

    #[test]
    fn test_flag_argument_is_optional() {
        let records = extract_depot_keys("addappid(228990, \"c0ffee\")\n");
        assert_eq!(records, vec![DepotKey::new("228990", "c0ffee")]);
    }

    #[test]
    fn test_call_without_secret_yields_nothing() {
        assert!(extract_depot_keys("foo(440900)\n").is_empty());
        assert!(extract_depot_keys("addappid(440900, 1)\n").is_empty());
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let text = "-- header\n\naddappid(1, 0, \"aa\")\n-- addappid(2, 0, \"bb\")\n";
        let records = extract_depot_keys(text);
        assert_eq!(records, vec![DepotKey::new("1", "aa")]);
    }

    #[test]
    fn test_non_hex_secret_rejected() {
        assert!(extract_depot_keys("addappid(1, 0, \"not-hex!\")\n").is_empty());
    }

    #[test]
    fn test_source_order_and_duplicates_kept() {
        let text = "addappid(2, 0, \"bb\")\naddappid(1, 0, \"aa\")\naddappid(2, 0, \"cc\")\n";
        let records = extract_depot_keys(text);
        assert_eq!(
            records,
            vec![
                DepotKey::new("2", "bb"),
                DepotKey::new("1", "aa"),
                DepotKey::new("2", "cc"),
            ]
        );
    }
}
