//! KeyValues tree model, parser and serializer.
//!
//! The format is line oriented: `//` lines are comments, a lone `{` opens
//! the block of the most recently declared key, a lone `}` closes it, and
//! every other line is a sequence of `"..."`-quoted tokens. One token
//! declares a section, two tokens form a key/value leaf.
//!
//! Parsing is best-effort by design. Real-world key files are frequently
//! slightly malformed and callers rely on getting a partial tree back, so
//! [`parse`] never fails; it is up to the caller to check that the keys it
//! expects are actually present.

use std::collections::BTreeMap;
use std::fmt;

/// A node in a KeyValues tree.
///
/// A node is either a scalar leaf or a section holding named children.
/// An empty section is legal and represents an empty `{}` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A scalar leaf value.
    Value(String),
    /// A section with named child nodes.
    Section(BTreeMap<String, Node>),
}

impl Node {
    /// Creates an empty section node.
    pub fn section() -> Self {
        Node::Section(BTreeMap::new())
    }

    /// Returns `true` if this node is a section.
    pub fn is_section(&self) -> bool {
        matches!(self, Node::Section(_))
    }

    /// Gets a direct child of a section node by key.
    ///
    /// Returns `None` on leaf nodes and for missing keys.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Section(children) => children.get(key),
            Node::Value(_) => None,
        }
    }

    /// Gets the scalar value of a leaf node.
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Node::Value(v) => Some(v),
            Node::Section(_) => None,
        }
    }

    /// Gets the child map of a section node.
    pub fn as_section(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Section(children) => Some(children),
            Node::Value(_) => None,
        }
    }

    /// Serializes the children of this section at the given indent depth.
    ///
    /// For each section all leaf children are emitted first, then all
    /// section children. Downstream consumers of the host format tolerate
    /// sibling reordering but not interleaving, so the two-pass emission
    /// order is contractual regardless of the child map's iteration order.
    ///
    /// Leaves render as `"key"\t\t"value"`, sections as the bare key line
    /// followed by a brace-delimited block, with one tab per depth level.
    /// Called on a leaf node this returns an empty string.
    pub fn serialize(&self, depth: usize) -> String {
        let Node::Section(children) = self else {
            return String::new();
        };
        let indent = "\t".repeat(depth);
        let mut out = String::new();

        for (key, child) in children {
            if let Node::Value(value) = child {
                out.push_str(&format!("{indent}\"{key}\"\t\t\"{value}\"\n"));
            }
        }

        for (key, child) in children {
            if child.is_section() {
                out.push_str(&format!("{indent}\"{key}\"\n{indent}{{\n"));
                out.push_str(&child.serialize(depth + 1));
                out.push_str(&format!("{indent}}}\n"));
            }
        }

        out
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize(0))
    }
}

/// Parses KeyValues text into a tree, rooted at an implicit section.
///
/// Blank lines and `//` comment lines are skipped. A `{` line is only a
/// structural marker (the section was already opened by its key line) and
/// performs no tree mutation. A `}` line beyond the root is ignored, and
/// sections left open at end of input are kept with whatever children they
/// collected. This never fails; garbage input yields a near-empty root.
pub fn parse(text: &str) -> Node {
    // One (key, children) frame per open section; index 0 is the root.
    let mut stack: Vec<(String, BTreeMap<String, Node>)> = vec![(String::new(), BTreeMap::new())];

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if line == "{" {
            continue;
        }
        if line == "}" {
            if stack.len() > 1 {
                let (key, children) = stack.pop().unwrap();
                stack.last_mut().unwrap().1.insert(key, Node::Section(children));
            }
            continue;
        }

        let tokens = quoted_tokens(line);
        match tokens.as_slice() {
            [] => {}
            [key] => stack.push((key.to_string(), BTreeMap::new())),
            [key, value, ..] => {
                if value.is_empty() {
                    // An empty second token reads as a section declaration,
                    // same as a bare key line.
                    stack.push((key.to_string(), BTreeMap::new()));
                } else {
                    stack
                        .last_mut()
                        .unwrap()
                        .1
                        .insert(key.to_string(), Node::Value(value.to_string()));
                }
            }
        }
    }

    // Unterminated sections are attached to their parents as-is.
    while stack.len() > 1 {
        let (key, children) = stack.pop().unwrap();
        stack.last_mut().unwrap().1.insert(key, Node::Section(children));
    }

    let (_, root) = stack.pop().unwrap();
    Node::Section(root)
}

/// Extracts the `"..."`-quoted tokens of a line, in order.
///
/// Only complete quote pairs yield tokens; a trailing unmatched quote is
/// dropped.
fn quoted_tokens(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut chunks = line.split('"');
    chunks.next(); // text before the first quote
    while let Some(inner) = chunks.next() {
        if chunks.next().is_none() {
            // Unmatched opening quote.
            break;
        }
        tokens.push(inner);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(v: &str) -> Node {
        Node::Value(v.to_string())
    }

    #[test]
    fn test_parse_flat_pairs() {
        let root = parse("\"appid\"\t\t\"440900\"\n\"Universe\"\t\t\"1\"\n");
        assert_eq!(root.get("appid"), Some(&leaf("440900")));
        assert_eq!(root.get("Universe"), Some(&leaf("1")));
    }

    #[test]
    fn test_parse_nested_sections() {
        let text = "\"AppState\"\n{\n\t\"appid\"\t\t\"7\"\n\t\"UserConfig\"\n\t{\n\t}\n}\n";
        let root = parse(text);
        let app = root.get("AppState").unwrap();
        assert_eq!(app.get("appid"), Some(&leaf("7")));
        assert_eq!(app.get("UserConfig"), Some(&Node::section()));
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let text = "// header comment\n\n\"key\"\t\t\"value\"\n\n// trailing\n";
        let root = parse(text);
        assert_eq!(root.as_section().unwrap().len(), 1);
        assert_eq!(root.get("key"), Some(&leaf("value")));
    }

    #[test]
    fn test_parse_tolerates_excess_closes() {
        // An extra `}` beyond the root must neither raise nor disturb
        // already-closed sections.
        let text = "\"a\"\n{\n\t\"k\"\t\t\"v\"\n}\n}\n\"b\"\t\t\"2\"\n";
        let root = parse(text);
        assert_eq!(root.get("a").unwrap().get("k"), Some(&leaf("v")));
        assert_eq!(root.get("b"), Some(&leaf("2")));
    }

    #[test]
    fn test_parse_keeps_unterminated_sections() {
        let text = "\"outer\"\n{\n\t\"inner\"\n\t{\n\t\t\"k\"\t\t\"v\"\n";
        let root = parse(text);
        let inner = root.get("outer").unwrap().get("inner").unwrap();
        assert_eq!(inner.get("k"), Some(&leaf("v")));
    }

    #[test]
    fn test_parse_empty_value_opens_section() {
        let root = parse("\"block\"\t\t\"\"\n{\n\t\"k\"\t\t\"v\"\n}\n");
        assert_eq!(root.get("block").unwrap().get("k"), Some(&leaf("v")));
    }

    #[test]
    fn test_parse_garbage_yields_empty_root() {
        let root = parse("no quotes here\n!!!\n");
        assert_eq!(root, Node::section());
    }

    #[test]
    fn test_serialize_leaves_before_sections() {
        let mut children = BTreeMap::new();
        children.insert("alpha".to_string(), Node::section());
        children.insert("zeta".to_string(), leaf("1"));
        let root = Node::Section(children);

        let out = root.serialize(0);
        // "zeta" sorts after "alpha" but leaves are emitted first.
        assert_eq!(out, "\"zeta\"\t\t\"1\"\n\"alpha\"\n{\n}\n");
    }

    #[test]
    fn test_serialize_indentation() {
        let root = parse("\"a\"\n{\n\"b\"\n{\n\"k\"\t\t\"v\"\n}\n}\n");
        let out = root.serialize(0);
        assert_eq!(out, "\"a\"\n{\n\t\"b\"\n\t{\n\t\t\"k\"\t\t\"v\"\n\t}\n}\n");
    }

    #[test]
    fn test_round_trip() {
        let text = "\"root\"\n{\n\t\"name\"\t\t\"Half-Life\"\n\t\"depots\"\n\t{\n\t\t\"221\"\n\t\t{\n\t\t\t\"DecryptionKey\"\t\t\"deadbeef\"\n\t\t}\n\t}\n}\n";
        let tree = parse(text);
        assert_eq!(parse(&tree.serialize(0)), tree);
    }

    #[test]
    fn test_quoted_tokens() {
        assert_eq!(quoted_tokens("\"a\" \"b\""), vec!["a", "b"]);
        assert_eq!(quoted_tokens("\"only\""), vec!["only"]);
        assert_eq!(quoted_tokens("\"a\" \"b\" \"c"), vec!["a", "b"]);
        assert!(quoted_tokens("none").is_empty());
    }
}
