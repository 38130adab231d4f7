//! Provides Trie iterators.
//!
//! Both iterators walk the trie in pre-order with an explicit stack, visiting
//! children in symbol order, so words come out lexicographically sorted.
use crate::export::SerialRecord;
use crate::trie::{Node, Trie};

/// Iterator over the words stored in a Trie.
#[derive(Debug)]
pub struct Words<'a> {
    first: Option<String>,
    prefix: Vec<char>,
    nodes: Vec<(&'a Node, usize)>,
}

impl<'a> Words<'a> {
    pub(crate) fn new(start: Option<&'a Node>, prefix: Vec<char>) -> Self {
        let mut first = None;
        let mut nodes = vec![];
        if let Some(node) = start {
            if node.terminated {
                first = Some(prefix.iter().collect());
            }
            let depth = prefix.len() + 1;
            nodes.extend(node.children.iter().rev().map(|child| (child, depth)));
        }
        Self {
            first,
            prefix,
            nodes,
        }
    }
}

impl<'a> Iterator for Words<'a> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(word) = self.first.take() {
            return Some(word);
        }
        while let Some((node, depth)) = self.nodes.pop() {
            self.prefix.truncate(depth - 1);
            self.prefix.push(node.symbol);
            self.nodes
                .extend(node.children.iter().rev().map(|child| (child, depth + 1)));
            if node.terminated {
                return Some(self.prefix.iter().collect());
            }
        }
        None
    }
}

impl<'a> IntoIterator for &'a Trie {
    type Item = String;
    type IntoIter = Words<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.words()
    }
}

/// Iterator over the nodes of a Trie (head excluded) in pre-order, each
/// described as a [`SerialRecord`].
#[derive(Debug)]
pub struct Records<'a> {
    depth: usize,
    nodes: Vec<(&'a Node, usize)>,
}

impl<'a> Records<'a> {
    pub(crate) fn new(head: &'a Node) -> Self {
        Self {
            depth: 0,
            nodes: head.children.iter().rev().map(|child| (child, 1)).collect(),
        }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = SerialRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.nodes.pop()?;
        self.nodes
            .extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        let delta = depth as i64 - self.depth as i64;
        self.depth = depth;
        Some(SerialRecord {
            delta,
            symbol: node.symbol,
            terminal: node.terminated,
        })
    }
}
