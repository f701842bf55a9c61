//! Flat depot key records.

use crate::node::Node;

/// A depot id paired with its decryption key.
///
/// Records are extracted either from a `key.vdf` tree (see
/// [`DepotKey::from_key_vdf`]) or from a Lua unlock script (see
/// [`crate::lua::extract_depot_keys`]) and consumed in order by whatever
/// writes them into the host document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepotKey {
    /// Numeric depot identifier, as a string.
    pub id: String,
    /// Hex decryption key.
    pub key: String,
}

impl DepotKey {
    /// Creates a record from an id and key.
    pub fn new(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
        }
    }

    /// Collects depot keys from a parsed `key.vdf` tree.
    ///
    /// Walks the root's `depots` section and yields one record per child
    /// section that carries a `DecryptionKey` leaf. Children without a key
    /// are skipped. Returns an empty list when the `depots` section is
    /// missing, which callers treat as "no records found".
    pub fn from_key_vdf(root: &Node) -> Vec<DepotKey> {
        let mut records = Vec::new();

        let Some(depots) = root.get("depots").and_then(Node::as_section) else {
            return records;
        };

        for (depot_id, depot) in depots {
            if let Some(key) = depot.get("DecryptionKey").and_then(Node::as_value) {
                records.push(DepotKey::new(depot_id, key));
            }
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::parse;

    #[test]
    fn test_from_key_vdf() {
        let text = "\"depots\"\n{\n\t\"228990\"\n\t{\n\t\t\"DecryptionKey\"\t\t\"aa11\"\n\t}\n\t\"229000\"\n\t{\n\t\t\"DecryptionKey\"\t\t\"bb22\"\n\t}\n}\n";
        let records = DepotKey::from_key_vdf(&parse(text));
        assert_eq!(
            records,
            vec![DepotKey::new("228990", "aa11"), DepotKey::new("229000", "bb22")]
        );
    }

    #[test]
    fn test_from_key_vdf_skips_keyless_depots() {
        let text = "\"depots\"\n{\n\t\"1\"\n\t{\n\t}\n\t\"2\"\n\t{\n\t\t\"DecryptionKey\"\t\t\"cc33\"\n\t}\n}\n";
        let records = DepotKey::from_key_vdf(&parse(text));
        assert_eq!(records, vec![DepotKey::new("2", "cc33")]);
    }

    #[test]
    fn test_from_key_vdf_missing_section() {
        assert!(DepotKey::from_key_vdf(&parse("\"other\"\n{\n}\n")).is_empty());
    }
}
