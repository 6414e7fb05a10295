use std::collections::VecDeque;

use tracing::{debug, debug_span, warn};

use super::{BoostTrie, TrieNode, ROOT};
use crate::boost::BoostMap;
use crate::unicode::char_index;

impl BoostTrie {
    /// Compile a boost map.
    ///
    /// Pass 1 creates the path of every prefix, pass 2 the boosted child
    /// of each prefix, then one breadth-first pass sets failure links and
    /// inherited boosts. `BoostMap` iterates in sorted order and children
    /// are kept sorted, so equal maps always give identical tries.
    pub fn from_boosts(boosts: &BoostMap) -> Self {
        let _span = debug_span!("build_trie", prefixes = boosts.len()).entered();
        let mut trie = BoostTrie {
            nodes: vec![TrieNode::new()],
        };

        let mut ends = Vec::with_capacity(boosts.len());
        for (prefix, chars) in boosts {
            let Some(keys) = letter_keys(prefix.chars()) else {
                warn!(prefix = prefix.as_str(), "skipping prefix with non a-z letters");
                continue;
            };
            let mut node = ROOT;
            for key in keys {
                node = trie.child_or_insert(node, key);
            }
            ends.push((node, chars));
        }

        for (node, chars) in ends {
            for (&c, &boost) in chars {
                let Some(key) = char_index(c) else {
                    warn!(%c, "skipping boost for non a-z letter");
                    continue;
                };
                let child = trie.child_or_insert(node, key);
                let child = &mut trie.nodes[child as usize];
                child.boost = boost as f32;
                child.explicit = true;
            }
        }

        trie.link_failures();
        debug!(nodes = trie.node_count(), edges = trie.edge_count());
        trie
    }

    fn child_or_insert(&mut self, parent: u32, key: u8) -> u32 {
        let next_idx = self.nodes.len() as u32;
        let children = &mut self.nodes[parent as usize].children;
        match children.binary_search_by_key(&key, |&(k, _)| k) {
            Ok(i) => children[i].1,
            Err(i) => {
                children.insert(i, (key, next_idx));
                self.nodes.push(TrieNode::new());
                next_idx
            }
        }
    }

    /// Breadth-first failure-link computation. A node's failure target is
    /// always shallower, so it is final by the time the node is visited and
    /// its boost can be inherited directly.
    fn link_failures(&mut self) {
        let mut queue = VecDeque::new();
        for &(_, child) in &self.nodes[ROOT as usize].children {
            queue.push_back(child);
        }
        for &child in &queue {
            self.nodes[child as usize].fail = ROOT;
        }

        while let Some(u) = queue.pop_front() {
            for i in 0..self.nodes[u as usize].children.len() {
                let (key, v) = self.nodes[u as usize].children[i];

                let mut f = self.nodes[u as usize].fail;
                while f != ROOT && self.nodes[f as usize].child(key).is_none() {
                    f = self.nodes[f as usize].fail;
                }
                let fail = match self.nodes[f as usize].child(key) {
                    Some(target) if target != v => target,
                    _ => ROOT,
                };

                let inherited = self.nodes[fail as usize].boost;
                let node = &mut self.nodes[v as usize];
                node.fail = fail;
                if !node.explicit {
                    node.boost = inherited;
                }
                queue.push_back(v);
            }
        }
    }
}

fn letter_keys(chars: impl Iterator<Item = char>) -> Option<Vec<u8>> {
    chars.map(char_index).collect()
}
