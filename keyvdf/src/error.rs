//! Error types for KeyValues operations.
//!
//! Parsing and extraction are deliberately infallible (malformed input
//! yields a partial result); only section editing can fail, because
//! splicing at a wrong offset would corrupt the host document.

use thiserror::Error;

/// Result alias for fallible keyvdf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the section editor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The quoted section key does not occur in the document.
    #[error("section \"{key}\" not found in document")]
    SectionNotFound {
        /// The section key that was searched for.
        key: String,
    },

    /// The section's opening brace has no balanced closing brace.
    #[error("section \"{key}\" has no balanced closing brace")]
    UnbalancedSection {
        /// The section key whose block is unterminated.
        key: String,
    },
}
