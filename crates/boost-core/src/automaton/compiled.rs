use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use super::codec::{Layout, HEADER_SIZE, MAGIC, VERSION};
use super::{FormatError, ROOT};
use crate::unicode::{char_index, index_char};

/// Backing storage: owned bytes or a read-only memory map.
enum Storage {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Storage {
    fn bytes(&self) -> &[u8] {
        match self {
            Storage::Owned(v) => v.as_slice(),
            Storage::Mapped(m) => &m[..],
        }
    }
}

/// Read-only view of a serialized automaton.
///
/// All lookups are allocation-free reads from the flat sections; the layout
/// is validated once when the trie is opened.
pub struct CompiledTrie {
    storage: Storage,
    node_count: u32,
    edge_count: u32,
    offsets_start: usize,
    keys_start: usize,
    targets_start: usize,
    fails_start: usize,
    boosts_start: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrieStats {
    pub node_count: u32,
    pub edge_count: u32,
    /// Nodes with a non-zero boost (own or inherited).
    pub boosted_nodes: u32,
    pub max_boost: f32,
    pub mean_boost: f32,
}

/// One letter of a [`CompiledTrie::walk`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkStep {
    pub letter: char,
    /// Boost applied when this letter was generated.
    pub boost: f32,
    /// State after consuming the letter.
    pub state: u32,
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

fn read_i32(data: &[u8], pos: usize) -> i32 {
    i32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

fn read_f32(data: &[u8], pos: usize) -> f32 {
    f32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

fn corrupt(msg: String) -> FormatError {
    FormatError::Corrupt(msg)
}

impl CompiledTrie {
    /// Parse from owned bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, FormatError> {
        Self::new(Storage::Owned(data))
    }

    /// Open a compiled trie using memory-mapped I/O.
    pub fn open(path: &Path) -> Result<Self, FormatError> {
        let file = File::open(path)?;
        // SAFETY: The file is opened read-only and the mapping is immutable.
        // The Mmap lives in `self.storage` for as long as the trie does.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::new(Storage::Mapped(mmap))
    }

    fn new(storage: Storage) -> Result<Self, FormatError> {
        let data = storage.bytes();
        if data.len() < HEADER_SIZE {
            return Err(FormatError::InvalidHeader);
        }
        if &data[..4] != MAGIC {
            return Err(FormatError::InvalidMagic);
        }
        let version = read_u32(data, 4);
        if version != VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }
        let node_count = read_u32(data, 8);
        let edge_count = read_u32(data, 12);
        if node_count == 0 {
            return Err(corrupt("no root node".to_string()));
        }

        let layout = Layout {
            node_count: node_count as usize,
            edge_count: edge_count as usize,
        };
        if data.len() != layout.total() {
            return Err(corrupt(format!(
                "expected {} bytes, got {}",
                layout.total(),
                data.len()
            )));
        }

        let trie = Self {
            node_count,
            edge_count,
            offsets_start: layout.offsets_start(),
            keys_start: layout.keys_start(),
            targets_start: layout.targets_start(),
            fails_start: layout.fails_start(),
            boosts_start: layout.boosts_start(),
            storage,
        };
        trie.validate()?;
        Ok(trie)
    }

    /// Check every index the lookup paths rely on.
    fn validate(&self) -> Result<(), FormatError> {
        let data = self.storage.bytes();
        let in_nodes = |v: i32| v >= 0 && (v as u32) < self.node_count;

        let mut prev = 0i32;
        for i in 0..=self.node_count as usize {
            let off = read_i32(data, self.offsets_start + i * 4);
            if off < prev || (i == 0 && off != 0) {
                return Err(corrupt(format!("node offsets not monotonic at node {i}")));
            }
            prev = off;
        }
        if prev as u32 != self.edge_count {
            return Err(corrupt(format!(
                "last offset {prev} does not match edge count {}",
                self.edge_count
            )));
        }

        for node in 0..self.node_count {
            let (start, end) = self.edge_range(node);
            let mut last_key = None;
            for e in start..end {
                let key = data[self.keys_start + e];
                if key >= 26 || last_key.is_some_and(|k| k >= key) {
                    return Err(corrupt(format!("bad edge key {key} at node {node}")));
                }
                last_key = Some(key);
                if !in_nodes(read_i32(data, self.targets_start + e * 4)) {
                    return Err(corrupt(format!("edge target out of range at node {node}")));
                }
            }
            if !in_nodes(read_i32(data, self.fails_start + node as usize * 4)) {
                return Err(corrupt(format!("failure link out of range at node {node}")));
            }
        }
        Ok(())
    }

    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    pub fn edge_count(&self) -> u32 {
        self.edge_count
    }

    fn edge_range(&self, node: u32) -> (usize, usize) {
        let data = self.storage.bytes();
        let pos = self.offsets_start + node as usize * 4;
        (read_u32(data, pos) as usize, read_u32(data, pos + 4) as usize)
    }

    /// Outgoing edges of `node` as (letter, target), sorted by letter.
    pub fn edges(&self, node: u32) -> Vec<(char, u32)> {
        if node >= self.node_count {
            return Vec::new();
        }
        let data = self.storage.bytes();
        let (start, end) = self.edge_range(node);
        (start..end)
            .filter_map(|e| {
                let letter = index_char(data[self.keys_start + e])?;
                Some((letter, read_u32(data, self.targets_start + e * 4)))
            })
            .collect()
    }

    pub fn fail_link(&self, node: u32) -> u32 {
        if node >= self.node_count {
            return ROOT;
        }
        read_u32(self.storage.bytes(), self.fails_start + node as usize * 4)
    }

    pub fn node_boost(&self, node: u32) -> f32 {
        if node >= self.node_count {
            return 0.0;
        }
        read_f32(self.storage.bytes(), self.boosts_start + node as usize * 4)
    }

    /// Direct transition; edges are sorted, so the scan stops early.
    fn find_transition(&self, state: u32, key: u8) -> Option<u32> {
        let data = self.storage.bytes();
        let (start, end) = self.edge_range(state);
        for e in start..end {
            let k = data[self.keys_start + e];
            if k == key {
                return Some(read_u32(data, self.targets_start + e * 4));
            }
            if k > key {
                break;
            }
        }
        None
    }

    /// Advance `state` by `c`, following failure links until a transition
    /// exists or the root is reached. Non `a..=z` input resets to the root.
    pub fn next_state(&self, state: u32, c: char) -> u32 {
        let Some(key) = char_index(c) else {
            return ROOT;
        };
        if state >= self.node_count {
            return ROOT;
        }
        let mut state = state;
        // A well-formed chain reaches the root in fewer than node_count
        // steps; the bound only guards against cyclic links in a bad file.
        for _ in 0..self.node_count {
            if let Some(next) = self.find_transition(state, key) {
                return next;
            }
            if state == ROOT {
                return ROOT;
            }
            state = self.fail_link(state);
        }
        ROOT
    }

    /// Boost to add to the logit of `c` after the prefix at `state`.
    pub fn boost(&self, state: u32, c: char) -> f32 {
        self.node_boost(self.next_state(state, c))
    }

    /// Feed `word` letter by letter from the root.
    pub fn walk(&self, word: &str) -> Vec<WalkStep> {
        let mut state = ROOT;
        word.chars()
            .map(|letter| {
                state = self.next_state(state, letter);
                WalkStep {
                    letter,
                    boost: self.node_boost(state),
                    state,
                }
            })
            .collect()
    }

    pub fn stats(&self) -> TrieStats {
        let mut boosted = 0u32;
        let mut max = 0f32;
        let mut sum = 0f64;
        for node in 0..self.node_count {
            let b = self.node_boost(node);
            if b > 0.0 {
                boosted += 1;
                max = max.max(b);
                sum += f64::from(b);
            }
        }
        TrieStats {
            node_count: self.node_count,
            edge_count: self.edge_count,
            boosted_nodes: boosted,
            max_boost: max,
            mean_boost: if boosted > 0 {
                (sum / f64::from(boosted)) as f32
            } else {
                0.0
            },
        }
    }
}
