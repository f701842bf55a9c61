//! Balanced-brace section locating and in-place entry upserting.
//!
//! The editor never parses the host document. It finds one named section by
//! brace counting and splices entries in or out by byte offset, so every
//! byte outside the edited entries (comments, unknown fields, whatever
//! formatting the file happens to have) survives the edit untouched.

use crate::error::{Error, Result};
use crate::record::DepotKey;

// config.vdf nests the depots section five levels deep; entries use a
// fixed indentation template rather than inferring it from the file.
const ENTRY_INDENT: &str = "\t\t\t\t\t";
const FIELD_INDENT: &str = "\t\t\t\t\t\t";

/// Inserts or replaces depot key entries inside a named section.
///
/// The first occurrence of the quoted `section_key` is located, then the
/// next `{` and its balanced closing brace. Each record is searched for
/// (as a quoted id, within the section's byte range only); an existing
/// entry is spliced out first, then a fresh entry is appended immediately
/// before the section's closing brace. Records are applied in input order
/// and the operation is idempotent per id.
///
/// The id search is a plain substring match within the section, exactly as
/// the format's established consumers do it; an id string occurring inside
/// an unrelated value in the same section would be matched too.
///
/// # Errors
///
/// Fails when the section key is absent or its block has no balanced
/// closing brace. Callers must not write the document in that case.
pub fn upsert_depot_keys(
    document: &str,
    section_key: &str,
    records: &[DepotKey],
) -> Result<String> {
    let not_found = || Error::SectionNotFound {
        key: section_key.to_string(),
    };
    let unbalanced = || Error::UnbalancedSection {
        key: section_key.to_string(),
    };

    let quoted = format!("\"{section_key}\"");
    let key_pos = document.find(&quoted).ok_or_else(not_found)?;
    let open = document[key_pos..]
        .find('{')
        .map(|rel| key_pos + rel)
        .ok_or_else(unbalanced)?;

    let mut close = matching_close(document.as_bytes(), open).ok_or_else(unbalanced)?;

    let mut doc = document.to_string();

    for record in records {
        let pattern = format!("\"{}\"", record.id);

        // Update: splice the existing entry out before re-inserting.
        if let Some(rel) = doc[open + 1..close].find(&pattern) {
            let hit = open + 1 + rel;
            if let Some((line_start, entry_end)) = entry_span(doc.as_bytes(), hit, close) {
                doc.replace_range(line_start..entry_end, "");
                close -= entry_end - line_start;
            }
        }

        let entry = format!(
            "{ENTRY_INDENT}\"{}\"\n{ENTRY_INDENT}{{\n{FIELD_INDENT}\"DecryptionKey\"\t\t\"{}\"\n{ENTRY_INDENT}}}\n",
            record.id, record.key
        );
        doc.insert_str(close, &entry);
        close += entry.len();
    }

    Ok(doc)
}

/// Finds the balanced closing brace for the `{` at `open`.
fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Computes the byte span of the entry whose quoted id starts at `hit`.
///
/// The span runs from the start of the id's line to just past the entry's
/// own closing brace, extended over one trailing newline. Returns `None`
/// when no entry block closes before `limit` (a bare id with no block).
fn entry_span(bytes: &[u8], hit: usize, limit: usize) -> Option<(usize, usize)> {
    let mut line_start = hit;
    while line_start > 0 && bytes[line_start - 1] != b'\n' {
        line_start -= 1;
    }

    let mut depth = 0i32;
    let mut entered = false;
    for i in hit..limit {
        match bytes[i] {
            b'{' => {
                depth += 1;
                entered = true;
            }
            b'}' => {
                depth -= 1;
                if entered && depth == 0 {
                    let mut end = i + 1;
                    if end < bytes.len() && bytes[end] == b'\n' {
                        end += 1;
                    }
                    return Some((line_start, end));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_DEPOTS: &str = "\"depots\"\n{\n}\n";

    fn key(id: &str, secret: &str) -> DepotKey {
        DepotKey::new(id, secret)
    }

    #[test]
    fn test_insert_into_empty_section() {
        let out = upsert_depot_keys(EMPTY_DEPOTS, "depots", &[key("1", "deadbeef")]).unwrap();
        assert!(out.starts_with("\"depots\"\n{\n"));
        assert!(out.ends_with("}\n"));
        assert!(out.contains("\t\t\t\t\t\"1\"\n"));
        assert!(out.contains("\"DecryptionKey\"\t\t\"deadbeef\""));
    }

    #[test]
    fn test_update_replaces_entry() {
        let first = upsert_depot_keys(EMPTY_DEPOTS, "depots", &[key("1", "deadbeef")]).unwrap();
        let second = upsert_depot_keys(&first, "depots", &[key("1", "feedface")]).unwrap();

        assert_eq!(second.matches("\"1\"").count(), 1);
        assert!(second.contains("\"DecryptionKey\"\t\t\"feedface\""));
        assert!(!second.contains("deadbeef"));
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let records = [key("10", "aa"), key("20", "bb")];
        let once = upsert_depot_keys(EMPTY_DEPOTS, "depots", &records).unwrap();
        let twice = upsert_depot_keys(&once, "depots", &records).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_section_fails() {
        let err = upsert_depot_keys("\"other\"\n{\n}\n", "depots", &[key("1", "aa")]).unwrap_err();
        assert_eq!(
            err,
            Error::SectionNotFound {
                key: "depots".to_string()
            }
        );
    }

    #[test]
    fn test_unbalanced_section_fails() {
        let err = upsert_depot_keys("\"depots\"\n{\n", "depots", &[key("1", "aa")]).unwrap_err();
        assert_eq!(
            err,
            Error::UnbalancedSection {
                key: "depots".to_string()
            }
        );
    }

    #[test]
    fn test_bytes_outside_section_preserved() {
        let doc = format!(
            "// Steam config\n\"before\"\t\t\"kept\"\n{EMPTY_DEPOTS}\"after\"\n{{\n\t\"x\"\t\t\"y\"\n}}\n"
        );
        let out = upsert_depot_keys(&doc, "depots", &[key("5", "cc")]).unwrap();

        let open = doc.find("depots").unwrap();
        assert_eq!(&out[..open], &doc[..open]);
        let tail = "\"after\"\n{\n\t\"x\"\t\t\"y\"\n}\n";
        assert!(out.ends_with(tail));
        assert!(doc.ends_with(tail));
    }

    #[test]
    fn test_records_applied_in_input_order() {
        let records = [key("30", "cc"), key("10", "aa"), key("20", "bb")];
        let out = upsert_depot_keys(EMPTY_DEPOTS, "depots", &records).unwrap();

        let p30 = out.find("\"30\"").unwrap();
        let p10 = out.find("\"10\"").unwrap();
        let p20 = out.find("\"20\"").unwrap();
        assert!(p30 < p10 && p10 < p20);
    }

    #[test]
    fn test_update_inside_populated_section() {
        // An entry sandwiched between two others is replaced in place
        // (deleted, then re-appended at the end of the section).
        let records = [key("1", "aa"), key("2", "bb"), key("3", "cc")];
        let doc = upsert_depot_keys(EMPTY_DEPOTS, "depots", &records).unwrap();
        let out = upsert_depot_keys(&doc, "depots", &[key("2", "ff")]).unwrap();

        assert_eq!(out.matches("\"2\"").count(), 1);
        assert!(out.contains("\"DecryptionKey\"\t\t\"aa\""));
        assert!(out.contains("\"DecryptionKey\"\t\t\"ff\""));
        assert!(out.contains("\"DecryptionKey\"\t\t\"cc\""));
        assert!(!out.contains("\"bb\""));
    }
}
