//! Errors returned by the trie.
//!
//! Lookups and removals never fail: an absent word is an answer, not an
//! error. Errors only come from untyped input (heterogeneous word lists,
//! format selectors and reconstruction payloads).

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type TrieResult<T> = Result<T, TrieError>;

/// Everything which can go wrong when feeding data into, or pulling data out
/// of, a [`crate::trie::Trie`].
#[derive(Error, Debug)]
pub enum TrieError {
    /// A word list contained something other than a string.
    #[error("invalid input at index {index}: expected a string, found {found}")]
    InvalidInput {
        /// Position of the offending element.
        index: usize,
        /// Kind of value found instead.
        found: String,
    },

    /// An export format selector which isn't one of the four known formats.
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// A reconstruction payload which doesn't describe a valid trie.
    #[error("malformed export data: {0}")]
    MalformedExport(String),

    /// JSON text could not be produced or parsed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TrieError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        TrieError::MalformedExport(reason.into())
    }
}
