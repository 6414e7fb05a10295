use std::ffi::c_char;
use std::path::Path;
use std::ptr;

use boost_core::automaton::{CompiledTrie, ROOT};
use tracing::warn;

use super::{ffi_close, ffi_guard, owned_new};

/// Opaque handle over a memory-mapped trie.
pub struct PbTrie {
    pub(crate) inner: CompiledTrie,
}

/// Open a compiled trie. Returns null if the file is missing or invalid.
/// Free with `pb_trie_close`.
#[no_mangle]
#[must_use]
pub extern "C" fn pb_trie_open(path: *const c_char) -> *mut PbTrie {
    ffi_guard!(ptr::null_mut() ; str: path_str = path ,);
    match CompiledTrie::open(Path::new(path_str)) {
        Ok(inner) => owned_new(PbTrie { inner }),
        Err(e) => {
            warn!(path = path_str, error = %e, "failed to open boost trie");
            ptr::null_mut()
        }
    }
}

ffi_close!(pb_trie_close, PbTrie);

/// State after generating `ch` (a Unicode code point) from `state`.
/// Invalid handles or code points give the root state.
#[no_mangle]
pub extern "C" fn pb_trie_next_state(trie: *const PbTrie, state: u32, ch: u32) -> u32 {
    ffi_guard!(ROOT;
        ref: trie = trie,
        chr: c    = ch,
    );
    trie.inner.next_state(state, c)
}

/// Boost to add to the logit of `ch` after the prefix at `state`.
#[no_mangle]
pub extern "C" fn pb_trie_boost(trie: *const PbTrie, state: u32, ch: u32) -> f32 {
    ffi_guard!(0.0;
        ref: trie = trie,
        chr: c    = ch,
    );
    trie.inner.boost(state, c)
}

#[no_mangle]
pub extern "C" fn pb_trie_node_count(trie: *const PbTrie) -> u32 {
    ffi_guard!(0; ref: trie = trie,);
    trie.inner.node_count()
}

#[no_mangle]
pub extern "C" fn pb_trie_edge_count(trie: *const PbTrie) -> u32 {
    ffi_guard!(0; ref: trie = trie,);
    trie.inner.edge_count()
}
