//! Provides a simple Trie implementation for storing a set of words. Each
//! word is treated as a sequence of `char` symbols.
//!
//! The interface covers insertion, membership, prefix queries and removal of
//! words, plus export of the whole trie in one of four formats (see
//! [`crate::export::ExportFormat`]). The `Export` format is accepted back by
//! [`crate::trie::Trie::from_export`] to rebuild an identical trie.
//!
//! Every traversal uses an explicit stack, so very long words are safe to
//! store, export and drop.
//!
//! Examples:
//! * trie : [`crate::trie`]
//! * export : [`crate::export`]
//! * iterator : [`crate::iterator`]
//!
//! The library emits [`tracing`] events but never installs a subscriber.
//!
//! Typical usages for this data structure:
//!  - Dictionaries and spell checking
//!  - Prefix matching and autocompletion
//!  - Shipping a word list in a compact, reconstructible form
//!  - ...

pub mod error;

pub mod export;

pub mod iterator;

pub mod trie;

pub use error::{TrieError, TrieResult};
pub use export::{dismantle_json, ExportFormat, Exported, Serial, SerialRecord, Snapshot};
pub use trie::{Trie, TrieOptions};
