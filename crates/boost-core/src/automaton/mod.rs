//! Aho-Corasick automaton over boosted prefixes.
//!
//! `BoostTrie` is the build-time arena: nodes are addressed by dense `u32`
//! indices (root = 0), children point forward and failure links point to
//! the node of the longest proper suffix. A node's boost is the correction
//! for the letter that completes the path to it; nodes without a boost of
//! their own inherit the boost of their failure target.
//!
//! `CompiledTrie` reads the serialized form (`PBST` v2), either owned or
//! memory-mapped, and is what the decoder consults per generated letter.

mod builder;
mod codec;
mod compiled;
#[cfg(test)]
mod tests;

use std::io;

pub(crate) use codec::{tmp_path, write_atomic};
pub use codec::{HEADER_SIZE, MAGIC, VERSION};
pub use compiled::{CompiledTrie, TrieStats, WalkStep};

use crate::unicode::char_index;

/// Index of the root node (the empty prefix).
pub const ROOT: u32 = 0;

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes (expected PBST)")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u32),

    #[error("corrupt automaton: {0}")]
    Corrupt(String),

    #[error("automaton too large: {0}")]
    TooLarge(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrieNode {
    /// (letter index, child node), sorted by letter.
    pub(crate) children: Vec<(u8, u32)>,
    pub(crate) fail: u32,
    pub(crate) boost: f32,
    /// Set when the boost came from the boost map rather than inheritance.
    pub(crate) explicit: bool,
}

impl TrieNode {
    fn new() -> Self {
        Self {
            children: Vec::new(),
            fail: ROOT,
            boost: 0.0,
            explicit: false,
        }
    }

    pub fn children(&self) -> &[(u8, u32)] {
        &self.children
    }

    pub fn child(&self, key: u8) -> Option<u32> {
        self.children
            .binary_search_by_key(&key, |&(k, _)| k)
            .ok()
            .map(|i| self.children[i].1)
    }

    pub fn fail(&self) -> u32 {
        self.fail
    }

    pub fn boost(&self) -> f32 {
        self.boost
    }

    /// Whether the boost was assigned directly rather than inherited.
    pub fn has_own_boost(&self) -> bool {
        self.explicit
    }
}

/// Build-time automaton. Immutable once [`BoostTrie::from_boosts`] returns.
#[derive(Debug, Clone, PartialEq)]
pub struct BoostTrie {
    nodes: Vec<TrieNode>,
}

impl BoostTrie {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.children.len()).sum()
    }

    pub fn nodes(&self) -> &[TrieNode] {
        &self.nodes
    }

    pub fn node(&self, idx: u32) -> Option<&TrieNode> {
        self.nodes.get(idx as usize)
    }

    /// Number of nodes carrying their own (non-inherited) boost.
    pub fn boosted_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.explicit).count()
    }

    /// Advance `state` by `c`, falling back along failure links. Letters
    /// outside `a..=z` reset to the root.
    pub fn next_state(&self, state: u32, c: char) -> u32 {
        let Some(key) = char_index(c) else {
            return ROOT;
        };
        let mut state = state;
        loop {
            let Some(node) = self.node(state) else {
                return ROOT;
            };
            if let Some(next) = node.child(key) {
                return next;
            }
            if state == ROOT {
                return ROOT;
            }
            state = node.fail;
        }
    }

    /// Boost for generating `c` after the prefix represented by `state`.
    pub fn boost(&self, state: u32, c: char) -> f32 {
        let next = self.next_state(state, c);
        self.node(next).map_or(0.0, |n| n.boost)
    }
}
