use std::collections::{BTreeMap, VecDeque};

use proptest::prelude::*;

use super::*;
use crate::boost::BoostMap;

fn boost_map(entries: &[(&str, &[(char, f64)])]) -> BoostMap {
    entries
        .iter()
        .map(|(prefix, chars)| (prefix.to_string(), chars.iter().copied().collect()))
        .collect()
}

/// {"a": b, "ab": c, "b": d, "xab": c}
///
/// ```text
/// 0 root ─a→ 1 ─b→ 2 (1.6) ─c→ 7 (2.0)
///        ─b→ 3 ─d→ 8 (1.8)
///        ─x→ 4 ─a→ 5 ─b→ 6 ─c→ 9 (3.0)
/// ```
fn sample_trie() -> BoostTrie {
    BoostTrie::from_boosts(&boost_map(&[
        ("a", &[('b', 1.6)]),
        ("ab", &[('c', 2.0)]),
        ("b", &[('d', 1.8)]),
        ("xab", &[('c', 3.0)]),
    ]))
}

/// Path string spelled by every node, by breadth-first walk from the root.
fn paths(trie: &BoostTrie) -> Vec<String> {
    let mut paths = vec![String::new(); trie.node_count()];
    let mut queue = VecDeque::from([ROOT]);
    while let Some(u) = queue.pop_front() {
        for &(key, v) in trie.nodes()[u as usize].children() {
            let mut p = paths[u as usize].clone();
            p.push((b'a' + key) as char);
            paths[v as usize] = p;
            queue.push_back(v);
        }
    }
    paths
}

#[test]
fn test_node_layout() {
    let trie = sample_trie();
    assert_eq!(trie.node_count(), 10);
    assert_eq!(trie.edge_count(), 9);
    let p = paths(&trie);
    assert_eq!(p[1], "a");
    assert_eq!(p[2], "ab");
    assert_eq!(p[6], "xab");
    assert_eq!(p[9], "xabc");
}

#[test]
fn test_failure_links() {
    let trie = sample_trie();
    let fails: Vec<u32> = trie.nodes().iter().map(TrieNode::fail).collect();
    assert_eq!(fails, vec![0, 0, 3, 0, 0, 1, 2, 0, 0, 7]);
}

#[test]
fn test_explicit_boost_not_overwritten() {
    let trie = sample_trie();
    let n9 = &trie.nodes()[9];
    assert!(n9.has_own_boost());
    assert_eq!(n9.boost(), 3.0);
    // node 2 reached via "ab" keeps 1.6 although its failure target has 0.0
    assert_eq!(trie.nodes()[2].boost(), 1.6);
}

#[test]
fn test_inherited_boost() {
    let trie = sample_trie();
    let n6 = &trie.nodes()[6];
    assert!(!n6.has_own_boost());
    assert_eq!(n6.boost(), 1.6);
    assert_eq!(trie.nodes()[5].boost(), 0.0);
    assert_eq!(trie.nodes()[0].boost(), 0.0);
}

#[test]
fn test_next_state_falls_back_to_suffix() {
    let trie = sample_trie();
    let mut state = ROOT;
    for c in "xab".chars() {
        state = trie.next_state(state, c);
    }
    assert_eq!(state, 6);
    // no "xabd" path; longest suffix with a 'd' edge is "b"
    assert_eq!(trie.next_state(state, 'd'), 8);
    assert_eq!(trie.boost(state, 'd'), 1.8);
    assert_eq!(trie.boost(state, 'c'), 3.0);
    assert_eq!(trie.boost(ROOT, 'q'), 0.0);
    assert_eq!(trie.next_state(state, 'é'), ROOT);
    assert_eq!(trie.next_state(999, 'a'), ROOT);
}

#[test]
fn test_empty_map_is_root_only() {
    let trie = BoostTrie::from_boosts(&BoostMap::new());
    assert_eq!(trie.node_count(), 1);
    assert_eq!(trie.edge_count(), 0);

    let bytes = trie.to_bytes().unwrap();
    assert_eq!(bytes.len(), HEADER_SIZE + 8 + 4 + 4);
    let compiled = CompiledTrie::from_bytes(bytes).unwrap();
    assert_eq!(compiled.node_count(), 1);
    assert_eq!(compiled.edge_count(), 0);
    assert_eq!(compiled.boost(ROOT, 'a'), 0.0);
}

#[test]
fn test_header_bytes() {
    let bytes = sample_trie().to_bytes().unwrap();
    assert_eq!(&bytes[..4], b"PBST");
    assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 2);
    assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), 10);
    assert_eq!(u32::from_le_bytes(bytes[12..16].try_into().unwrap()), 9);
    // root's edges: a, b, x sorted ascending
    let keys_start = HEADER_SIZE + 11 * 4;
    assert_eq!(&bytes[keys_start..keys_start + 3], &[0, 1, 23]);
}

#[test]
fn test_round_trip() {
    let trie = sample_trie();
    let compiled = CompiledTrie::from_bytes(trie.to_bytes().unwrap()).unwrap();
    assert_eq!(compiled.node_count() as usize, trie.node_count());
    assert_eq!(compiled.edge_count() as usize, trie.edge_count());
    for (i, node) in trie.nodes().iter().enumerate() {
        let i = i as u32;
        let edges: Vec<(char, u32)> = node
            .children()
            .iter()
            .map(|&(k, t)| ((b'a' + k) as char, t))
            .collect();
        assert_eq!(compiled.edges(i), edges);
        assert_eq!(compiled.fail_link(i), node.fail());
        assert_eq!(compiled.node_boost(i), node.boost());
    }
}

#[test]
fn test_compiled_walk() {
    let compiled = CompiledTrie::from_bytes(sample_trie().to_bytes().unwrap()).unwrap();
    let steps = compiled.walk("xabd");
    let states: Vec<u32> = steps.iter().map(|s| s.state).collect();
    assert_eq!(states, vec![4, 5, 6, 8]);
    assert_eq!(steps[2].boost, 1.6);
    assert_eq!(steps[3].boost, 1.8);

    let stats = compiled.stats();
    assert_eq!(stats.node_count, 10);
    assert_eq!(stats.boosted_nodes, 5);
    assert_eq!(stats.max_boost, 3.0);
}

#[test]
fn test_save_and_mmap_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("fr.bin");
    let trie = sample_trie();
    trie.save(&path).unwrap();
    assert!(!tmp_path(&path).exists());
    let compiled = CompiledTrie::open(&path).unwrap();
    assert_eq!(compiled.node_count(), 10);
    assert_eq!(compiled.boost(6, 'c'), 3.0);
}

#[test]
fn test_tmp_path_keeps_extension() {
    let dir = std::path::Path::new("out");
    let bin = tmp_path(&dir.join("fr.bin"));
    let json = tmp_path(&dir.join("fr.json"));
    assert_eq!(bin, dir.join("fr.bin.tmp"));
    assert_eq!(json, dir.join("fr.json.tmp"));
    assert_ne!(bin, json);
}

#[test]
fn test_reject_bad_headers() {
    let good = sample_trie().to_bytes().unwrap();

    assert!(matches!(
        CompiledTrie::from_bytes(good[..10].to_vec()),
        Err(FormatError::InvalidHeader)
    ));

    let mut bad_magic = good.clone();
    bad_magic[..4].copy_from_slice(b"XXXX");
    assert!(matches!(
        CompiledTrie::from_bytes(bad_magic),
        Err(FormatError::InvalidMagic)
    ));

    let mut bad_version = good.clone();
    bad_version[4..8].copy_from_slice(&1u32.to_le_bytes());
    assert!(matches!(
        CompiledTrie::from_bytes(bad_version),
        Err(FormatError::UnsupportedVersion(1))
    ));

    assert!(matches!(
        CompiledTrie::from_bytes(good[..good.len() - 1].to_vec()),
        Err(FormatError::Corrupt(_))
    ));
}

#[test]
fn test_reject_out_of_range_target() {
    let mut bytes = sample_trie().to_bytes().unwrap();
    // first edge target sits right after the 9 key bytes
    let targets_start = HEADER_SIZE + 11 * 4 + 9;
    bytes[targets_start..targets_start + 4].copy_from_slice(&100i32.to_le_bytes());
    assert!(matches!(
        CompiledTrie::from_bytes(bytes),
        Err(FormatError::Corrupt(_))
    ));
}

#[test]
fn test_cyclic_fail_links_terminate() {
    let mut bytes = sample_trie().to_bytes().unwrap();
    let fails_start = HEADER_SIZE + 11 * 4 + 9 + 9 * 4;
    // 5 -> 6 and 6 -> 5
    bytes[fails_start + 20..fails_start + 24].copy_from_slice(&6i32.to_le_bytes());
    bytes[fails_start + 24..fails_start + 28].copy_from_slice(&5i32.to_le_bytes());
    let compiled = CompiledTrie::from_bytes(bytes).unwrap();
    assert_eq!(compiled.next_state(6, 'q'), ROOT);
}

fn arb_boost_map() -> impl Strategy<Value = BoostMap> {
    prop::collection::btree_map(
        "[abc]{1,4}",
        prop::collection::btree_map(prop::sample::select(vec!['a', 'b', 'c', 'd']), 1.6f64..6.0, 1..4),
        0..12,
    )
}

proptest! {
    #[test]
    fn prop_failure_links_are_longest_proper_suffixes(boosts in arb_boost_map()) {
        let trie = BoostTrie::from_boosts(&boosts);
        let p = paths(&trie);
        let by_path: BTreeMap<&str, u32> =
            p.iter().enumerate().map(|(i, s)| (s.as_str(), i as u32)).collect();
        for (v, node) in trie.nodes().iter().enumerate().skip(1) {
            let path = &p[v];
            let expected = (1..path.len())
                .find_map(|start| by_path.get(&path[start..]).copied())
                .unwrap_or(ROOT);
            prop_assert_eq!(node.fail(), expected, "node {} path {}", v, path);
            let fail_path = &p[node.fail() as usize];
            prop_assert!(fail_path.len() < path.len() && path.ends_with(fail_path.as_str()));
        }
    }

    #[test]
    fn prop_inheritance_and_explicit_boosts(boosts in arb_boost_map()) {
        let trie = BoostTrie::from_boosts(&boosts);
        let p = paths(&trie);
        prop_assert_eq!(trie.nodes()[0].boost(), 0.0);
        for (v, node) in trie.nodes().iter().enumerate().skip(1) {
            if node.has_own_boost() {
                let (prefix, last) = p[v].split_at(p[v].len() - 1);
                let c = last.chars().next().unwrap();
                prop_assert_eq!(node.boost(), boosts[prefix][&c] as f32);
            } else {
                prop_assert_eq!(node.boost(), trie.nodes()[node.fail() as usize].boost());
            }
        }
    }

    #[test]
    fn prop_build_is_deterministic(boosts in arb_boost_map()) {
        let a = BoostTrie::from_boosts(&boosts).to_bytes().unwrap();
        let b = BoostTrie::from_boosts(&boosts.clone()).to_bytes().unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_compiled_matches_builder(boosts in arb_boost_map(), word in "[a-e]{0,12}") {
        let trie = BoostTrie::from_boosts(&boosts);
        let compiled = CompiledTrie::from_bytes(trie.to_bytes().unwrap()).unwrap();
        let mut s1 = ROOT;
        let mut s2 = ROOT;
        for c in word.chars() {
            prop_assert_eq!(trie.boost(s1, c), compiled.boost(s2, c));
            s1 = trie.next_state(s1, c);
            s2 = compiled.next_state(s2, c);
            prop_assert_eq!(s1, s2);
        }
    }
}
