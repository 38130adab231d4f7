//! Provides a Trie for storing a set of words. Each word is stored as a
//! path of `char` symbols from the head of the trie, with the final node of
//! the path marked as terminated.
//!
//! Children are kept sorted by symbol, so every traversal of the trie (the
//! word iterator and all of the export formats) visits words in
//! lexicographic order.
//!
//! Example 1
//! ```
//! use wordtrie::trie::Trie;
//!
//! let mut trie = Trie::from_words(["cat", "car", "cart", "dog"]);
//! assert!(trie.contains("car"));
//! assert!(!trie.contains("ca"));
//! assert!(trie.starts_with("ca"));
//! assert!(trie.remove_word("car"));
//! assert!(trie.contains("cart"));
//! assert!(!trie.contains("car"));
//! ```
//!
//! Words can be folded to lowercase as they are stored and queried.
//!
//! Example 2
//! ```
//! use wordtrie::trie::{Trie, TrieOptions};
//!
//! let mut trie = Trie::with_options(TrieOptions::new().fold_case(true));
//! trie.add_words(["Apple", "APPS"]);
//! assert!(trie.contains("apple"));
//! assert!(trie.contains("ApPs"));
//! assert_eq!(trie.words().collect::<Vec<_>>(), vec!["apple", "apps"]);
//! ```
//!
//! Typical usages for this data structure:
//!  - Dictionaries and spell checking
//!  - Autocompletion of prefixes
//!  - Storing large numbers of words with significant amounts of
//!    prefix duplication

use std::borrow::Cow;
use std::fmt;
use std::mem;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::error::{TrieError, TrieResult};
use crate::iterator::{Records, Words};

/// Options controlling how words are turned into symbols.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrieOptions {
    fold_case: bool,
}

impl TrieOptions {
    /// Default options: words are stored exactly as given.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowercase every word before it is stored or looked up.
    pub fn fold_case(mut self, fold_case: bool) -> Self {
        self.fold_case = fold_case;
        self
    }

    /// Are words lowercased before use?
    pub fn folds_case(&self) -> bool {
        self.fold_case
    }

    pub(crate) fn normalise<'w>(&self, word: &'w str) -> Cow<'w, str> {
        if self.fold_case {
            Cow::Owned(word.to_lowercase())
        } else {
            Cow::Borrowed(word)
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Node {
    pub(crate) children: Vec<Node>,
    pub(crate) symbol: char,
    pub(crate) terminated: bool,
}

impl Node {
    pub(crate) fn new(symbol: char, terminated: bool) -> Self {
        Self {
            children: vec![],
            symbol,
            terminated,
        }
    }

    pub(crate) fn child_index(&self, symbol: char) -> Result<usize, usize> {
        self.children.binary_search_by_key(&symbol, |n| n.symbol)
    }

    pub(crate) fn child(&self, symbol: char) -> Option<&Node> {
        self.child_index(symbol).ok().map(|i| &self.children[i])
    }
}

// Dropping nested Vecs recurses once per level, so a very long word would
// exhaust the stack. Flatten the subtree instead.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Stores a set of words as individual nodes.
#[derive(Default)]
pub struct Trie {
    pub(crate) head: Node,
    pub(crate) count: usize,
    pub(crate) options: TrieOptions,
}

impl Trie {
    /// Create a new Trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Trie with the supplied options.
    pub fn with_options(options: TrieOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Create a new Trie holding every supplied word.
    pub fn from_words<I, W>(words: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        let mut trie = Self::new();
        trie.add_words(words);
        trie
    }

    /// Create a new Trie from a list of JSON values, each of which must be a
    /// string.
    pub fn from_values<'a, I>(values: I) -> TrieResult<Self>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut trie = Self::new();
        trie.add_values(values)?;
        Ok(trie)
    }

    /// The options this Trie was created with.
    pub fn options(&self) -> TrieOptions {
        self.options
    }

    /// Clear the Trie.
    pub fn clear(&mut self) {
        self.head = Node::default();
        self.count = 0;
    }

    /// How many words does the Trie contain?
    #[inline(always)]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Is the Trie empty?
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Insert every word, in order.
    pub fn add_words<I, W>(&mut self, words: I)
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        for word in words {
            self.add_word(word.as_ref());
        }
    }

    /// Insert every value, in order. Stops at the first value which isn't a
    /// string; the words before it remain inserted.
    pub fn add_values<'a, I>(&mut self, values: I) -> TrieResult<()>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        for (index, value) in values.into_iter().enumerate() {
            match value {
                Value::String(word) => {
                    self.add_word(word);
                }
                other => {
                    return Err(TrieError::InvalidInput {
                        index,
                        found: value_kind(other).to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    /// Insert the word into the Trie. Returns true if the word was not
    /// already present.
    pub fn add_word(&mut self, word: &str) -> bool {
        let word = self.options.normalise(word);
        let mut node = &mut self.head;

        for symbol in word.chars() {
            let index = match node.child_index(symbol) {
                Ok(i) => i,
                Err(i) => {
                    node.children.insert(i, Node::new(symbol, false));
                    i
                }
            };
            node = &mut node.children[index];
        }
        if node.terminated {
            return false;
        }
        node.terminated = true;
        self.count += 1;
        trace!(word = %word, count = self.count, "added word");
        true
    }

    /// Does the Trie contain the supplied word?
    pub fn contains(&self, word: &str) -> bool {
        self.find(word).map_or(false, |n| n.terminated)
    }

    /// Does any word in the Trie start with the supplied prefix? A word
    /// counts as a prefix of itself.
    pub fn starts_with(&self, prefix: &str) -> bool {
        if prefix.is_empty() {
            return !self.is_empty();
        }
        // Every node other than the head leads to at least one word
        self.find(prefix).is_some()
    }

    /// Does any word in the Trie strictly extend the supplied prefix?
    pub fn extends_prefix(&self, prefix: &str) -> bool {
        self.find(prefix).map_or(false, |n| !n.children.is_empty())
    }

    /// Remove the word from the Trie, pruning any branch which no longer
    /// leads to a word. Returns false if the word was not present.
    pub fn remove_word(&mut self, word: &str) -> bool {
        let word = self.options.normalise(word);

        // Child indices from the head down to the word, and the depth of the
        // deepest node which must survive the removal.
        let mut path = vec![];
        let mut keep = 0;
        let mut node = &self.head;
        for (depth, symbol) in word.chars().enumerate() {
            if node.terminated || node.children.len() > 1 {
                keep = depth;
            }
            match node.child_index(symbol) {
                Ok(i) => {
                    path.push(i);
                    node = &node.children[i];
                }
                Err(_) => return false,
            }
        }
        if !node.terminated {
            return false;
        }

        if node.children.is_empty() && !path.is_empty() {
            // Everything below `keep` is now a dead branch
            let mut parent = &mut self.head;
            for &i in &path[..keep] {
                parent = &mut parent.children[i];
            }
            parent.children.remove(path[keep]);
        } else {
            let mut target = &mut self.head;
            for &i in &path {
                target = &mut target.children[i];
            }
            target.terminated = false;
        }
        self.count -= 1;
        trace!(word = %word, count = self.count, "removed word");
        true
    }

    /// Remove every supplied word. Returns how many were present.
    pub fn remove_words<I, W>(&mut self, words: I) -> usize
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        words
            .into_iter()
            .filter(|w| self.remove_word(w.as_ref()))
            .count()
    }

    /// Create a lexicographically sorted iterator over the words in the Trie.
    pub fn words(&self) -> Words<'_> {
        Words::new(Some(&self.head), vec![])
    }

    /// Create a lexicographically sorted iterator over the words which
    /// start with the supplied prefix.
    pub fn words_with_prefix(&self, prefix: &str) -> Words<'_> {
        let prefix = self.options.normalise(prefix);
        let start = self.find_normalised(&prefix);
        Words::new(start, prefix.chars().collect())
    }

    /// Create a pre-order iterator over the nodes of the Trie, described as
    /// serial records.
    pub fn records(&self) -> Records<'_> {
        Records::new(&self.head)
    }

    fn find(&self, word: &str) -> Option<&Node> {
        self.find_normalised(&self.options.normalise(word))
    }

    fn find_normalised(&self, word: &str) -> Option<&Node> {
        let mut node = &self.head;
        for symbol in word.chars() {
            node = node.child(symbol)?;
        }
        Some(node)
    }

    /// Fold every node below the head bottom-up: `f` receives a node and the
    /// folded values of its children, in symbol order. Returns the folded
    /// children of the head.
    pub(crate) fn fold_children<T, F>(&self, mut f: F) -> Vec<T>
    where
        F: FnMut(&Node, Vec<T>) -> T,
    {
        // (node, next child to visit, folded children)
        let mut stack = vec![(&self.head, 0, Vec::with_capacity(self.head.children.len()))];
        loop {
            let top = stack.len() - 1;
            let (node, next) = (stack[top].0, stack[top].1);
            if let Some(child) = node.children.get(next) {
                stack[top].1 += 1;
                stack.push((child, 0, Vec::with_capacity(child.children.len())));
            } else if top == 0 {
                break;
            } else if let Some((node, _, folded)) = stack.pop() {
                let value = f(node, folded);
                stack[top - 1].2.push(value);
            }
        }
        stack.pop().map(|(_, _, folded)| folded).unwrap_or_default()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Clone for Trie {
    fn clone(&self) -> Self {
        let children = self.fold_children(|node, children| Node {
            children,
            symbol: node.symbol,
            terminated: node.terminated,
        });
        Self {
            head: Node {
                children,
                symbol: self.head.symbol,
                terminated: self.head.terminated,
            },
            count: self.count,
            options: self.options,
        }
    }
}

// Two tries are equal when they hold the same words with the same options.
// Tries never contain dead branches, so comparing records is enough.
impl PartialEq for Trie {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count
            && self.options == other.options
            && self.head.terminated == other.head.terminated
            && self.records().eq(other.records())
    }
}

impl Eq for Trie {}

impl fmt::Debug for Trie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trie")
            .field("count", &self.count)
            .field("options", &self.options)
            .field("words", &self.words().collect::<Vec<_>>())
            .finish()
    }
}

impl<W: AsRef<str>> FromIterator<W> for Trie {
    fn from_iter<I: IntoIterator<Item = W>>(iter: I) -> Self {
        Self::from_words(iter)
    }
}

impl<W: AsRef<str>> Extend<W> for Trie {
    fn extend<I: IntoIterator<Item = W>>(&mut self, iter: I) {
        self.add_words(iter);
    }
}
