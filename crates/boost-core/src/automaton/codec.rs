use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::{BoostTrie, FormatError};

pub const MAGIC: &[u8; 4] = b"PBST";
/// Version 2: sparse CSR layout.
pub const VERSION: u32 = 2;
/// magic(4) + version(4) + node_count(4) + edge_count(4).
pub const HEADER_SIZE: usize = 16;

/// Section lengths in bytes, in file order.
pub(super) struct Layout {
    pub node_count: usize,
    pub edge_count: usize,
}

impl Layout {
    pub fn offsets_start(&self) -> usize {
        HEADER_SIZE
    }
    pub fn keys_start(&self) -> usize {
        self.offsets_start() + (self.node_count + 1) * 4
    }
    pub fn targets_start(&self) -> usize {
        self.keys_start() + self.edge_count
    }
    pub fn fails_start(&self) -> usize {
        self.targets_start() + self.edge_count * 4
    }
    pub fn boosts_start(&self) -> usize {
        self.fails_start() + self.node_count * 4
    }
    pub fn total(&self) -> usize {
        self.boosts_start() + self.node_count * 4
    }
}

fn to_i32(value: usize, what: &str) -> Result<i32, FormatError> {
    i32::try_from(value).map_err(|_| FormatError::TooLarge(format!("{what} exceeds i32::MAX")))
}

impl BoostTrie {
    /// Serialize to the little-endian `PBST` v2 layout:
    ///
    /// | field        | size                    |
    /// |--------------|-------------------------|
    /// | magic        | 4                       |
    /// | version      | u32                     |
    /// | node_count   | u32                     |
    /// | edge_count   | u32                     |
    /// | node_offsets | (node_count + 1) × i32  |
    /// | edge_keys    | edge_count × u8         |
    /// | edge_targets | edge_count × i32        |
    /// | fail_links   | node_count × i32        |
    /// | boosts       | node_count × f32        |
    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        let layout = Layout {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
        };
        let node_count = to_i32(layout.node_count, "node count")?;
        let edge_count = to_i32(layout.edge_count, "edge count")?;

        let mut buf = Vec::with_capacity(layout.total());
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.extend_from_slice(&(node_count as u32).to_le_bytes());
        buf.extend_from_slice(&(edge_count as u32).to_le_bytes());

        let mut offset = 0i32;
        for node in &self.nodes {
            buf.extend_from_slice(&offset.to_le_bytes());
            offset += node.children.len() as i32;
        }
        buf.extend_from_slice(&offset.to_le_bytes());

        for node in &self.nodes {
            buf.extend(node.children.iter().map(|&(key, _)| key));
        }
        for node in &self.nodes {
            for &(_, target) in &node.children {
                buf.extend_from_slice(&(target as i32).to_le_bytes());
            }
        }
        for node in &self.nodes {
            buf.extend_from_slice(&(node.fail as i32).to_le_bytes());
        }
        for node in &self.nodes {
            buf.extend_from_slice(&node.boost.to_le_bytes());
        }

        debug_assert_eq!(buf.len(), layout.total());
        Ok(buf)
    }

    /// Atomic write: write to .tmp then rename.
    pub fn save(&self, path: &Path) -> Result<(), FormatError> {
        write_atomic(path, &self.to_bytes()?)?;
        Ok(())
    }
}

/// Write `bytes` next to `path` and rename into place.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

/// `fr.bin` → `fr.bin.tmp`; the full name is kept so sibling artifacts
/// of one language never share a temporary file.
pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
