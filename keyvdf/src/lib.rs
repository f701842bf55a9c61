//! # keyvdf - KeyValues Text Library
//!
//! A Rust library for reading, writing and surgically editing Steam's
//! KeyValues ("VDF") text format, plus extraction of depot decryption keys
//! from the Lua unlock-script dialect.
//!
//! ## Features
//!
//! - Forgiving line-based parser that never fails (garbage in, partial tree out)
//! - Serializer emitting the canonical tab-indented layout
//! - In-place `"depots"` section editing that preserves every byte outside
//!   the edited entries
//! - Regex extraction of depot keys from `addappid(...)`-style scripts
//!
//! ## Quick Start
//!
//! ```rust
//! use keyvdf::{DepotKey, parse, upsert_depot_keys};
//!
//! let root = parse("\"depots\"\n{\n\t\"228990\"\n\t{\n\t\t\"DecryptionKey\"\t\t\"ab12\"\n\t}\n}\n");
//! let keys = DepotKey::from_key_vdf(&root);
//! assert_eq!(keys[0].id, "228990");
//!
//! let doc = "\"InstallConfigStore\"\n{\n\t\"depots\"\n\t{\n\t}\n}\n";
//! let patched = upsert_depot_keys(doc, "depots", &keys).unwrap();
//! assert!(patched.contains("ab12"));
//! ```
//!
//! ## Modules
//!
//! - [`node`] - Tree model, parser and serializer
//! - [`edit`] - Balanced-brace section locator and entry upsert
//! - [`lua`] - Alternate-syntax (Lua script) key extractor
//! - [`record`] - The flat [`DepotKey`] record and tree walk
//! - [`error`] - Error types for the one fallible operation

/// Balanced-brace section locator and in-place entry editing.
pub mod edit;

/// Error types for section editing.
pub mod error;

/// Alternate-syntax (Lua unlock script) depot key extraction.
pub mod lua;

/// KeyValues tree model, parser and serializer.
pub mod node;

/// Flat depot key records extracted from either source format.
pub mod record;

pub use edit::upsert_depot_keys;
pub use error::{Error, Result};
pub use lua::extract_depot_keys;
pub use node::{Node, parse};
pub use record::DepotKey;
