//! Log-odds boosts of a target language against the baseline.
//!
//! For a prefix `p` and continuation `c`:
//!
//! ```text
//! P_t = (n_t + α) / (Σ n_t(p) + 26α)
//! P_b = (n_b + α) / (Σ n_b(p) + 26α)
//! delta = ln P_t − ln P_b
//! ```
//!
//! Deltas stay in natural-log units because the decoder adds them straight
//! onto model logits.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, warn};

use crate::stats::ContinuationTable;

/// Letters in the continuation alphabet, used as the smoothing mass.
const ALPHABET_SIZE: f64 = 26.0;

/// Boosts kept per prefix unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 5;

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// prefix → continuation letter → boost. Every value is `> threshold`.
pub type BoostMap = BTreeMap<String, BTreeMap<char, f64>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostParams {
    /// Additive smoothing constant.
    pub alpha: f64,
    /// Minimum delta (exclusive) for a continuation to be kept.
    pub threshold: f64,
    /// Minimum weighted target count for a continuation to be considered.
    pub min_target_count: u64,
    pub min_prefix_len: usize,
    pub max_prefix_len: usize,
    /// Boosts kept per prefix after thresholding; 0 keeps all.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for BoostParams {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            threshold: 1.5,
            min_target_count: 10,
            min_prefix_len: 2,
            max_prefix_len: crate::stats::DEFAULT_MAX_PREFIX_LEN,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl BoostParams {
    pub fn top_k_limit(&self) -> Option<usize> {
        (self.top_k > 0).then_some(self.top_k)
    }
}

/// Round to 4 decimal places so the report and the binary agree on values.
fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Log-odds of `c` following `prefix` in `target` versus `baseline`.
pub fn log_odds(
    target: &ContinuationTable,
    baseline: &ContinuationTable,
    prefix: &str,
    c: char,
    alpha: f64,
) -> f64 {
    let smoothing = ALPHABET_SIZE * alpha;
    let total_t = target.total(prefix) as f64 + smoothing;
    let total_b = baseline.total(prefix) as f64 + smoothing;
    let p_t = (target.count(prefix, c) as f64 + alpha) / total_t;
    let p_b = (baseline.count(prefix, c) as f64 + alpha) / total_b;
    p_t.ln() - p_b.ln()
}

/// Compute the thresholded boost map, then apply top-k trimming when
/// `params.top_k` is non-zero.
pub fn compute_boosts(
    target: &ContinuationTable,
    baseline: &ContinuationTable,
    params: &BoostParams,
) -> BoostMap {
    let _span = debug_span!("compute_boosts", prefixes = target.len()).entered();
    let mut boosts = BoostMap::new();
    let len_range = params.min_prefix_len..=params.max_prefix_len;

    for (prefix, counts) in target.iter() {
        if !len_range.contains(&prefix.len()) {
            continue;
        }
        let mut chars = BTreeMap::new();
        for (c, n_t) in counts.iter() {
            if n_t < params.min_target_count {
                continue;
            }
            let delta = round4(log_odds(target, baseline, prefix, c, params.alpha));
            if delta > params.threshold {
                chars.insert(c, delta);
            }
        }
        if !chars.is_empty() {
            boosts.insert(prefix.to_string(), chars);
        }
    }

    if let Some(k) = params.top_k_limit() {
        boosts = trim_top_k(boosts, k);
    }
    if boosts.is_empty() {
        warn!("no prefix cleared the boost threshold");
    }
    debug!(prefixes = boosts.len(), boosts = boost_count(&boosts));
    boosts
}

/// Keep the `k` largest boosts per prefix. Ties go to the earlier letter.
pub fn trim_top_k(boosts: BoostMap, k: usize) -> BoostMap {
    boosts
        .into_iter()
        .filter_map(|(prefix, chars)| {
            let mut ranked: Vec<(char, f64)> = chars.into_iter().collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
            ranked.truncate(k);
            if ranked.is_empty() {
                None
            } else {
                Some((prefix, ranked.into_iter().collect()))
            }
        })
        .collect()
}

/// Total number of (prefix, letter) boosts.
pub fn boost_count(boosts: &BoostMap) -> usize {
    boosts.values().map(BTreeMap::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::FrequencyCorpus;

    fn tables(
        target: &[(&str, u32)],
        baseline: &[(&str, u32)],
    ) -> (ContinuationTable, ContinuationTable) {
        let t = FrequencyCorpus::from_pairs(target.iter().copied());
        let b = FrequencyCorpus::from_pairs(baseline.iter().copied());
        (
            ContinuationTable::from_corpus(&t, 4),
            ContinuationTable::from_corpus(&b, 4),
        )
    }

    fn ve_tables() -> (ContinuationTable, ContinuationTable) {
        tables(
            &[("vertu", 50), ("venir", 80), ("vent", 40)],
            &[("very", 1000), ("vet", 200)],
        )
    }

    #[test]
    fn test_log_odds_formula() {
        let (t, b) = ve_tables();
        // target "ve": r=39, n=81 (total 120); baseline "ve": r=69, t=53 (total 122)
        let expected_n = ((81.0 + 1.0) / 146.0f64).ln() - ((0.0 + 1.0) / 148.0f64).ln();
        let expected_r = ((39.0 + 1.0) / 146.0f64).ln() - ((69.0 + 1.0) / 148.0f64).ln();
        assert!((log_odds(&t, &b, "ve", 'n', 1.0) - expected_n).abs() < 1e-12);
        assert!((log_odds(&t, &b, "ve", 'r', 1.0) - expected_r).abs() < 1e-12);
    }

    #[test]
    fn test_distinctive_continuation_boosted() {
        let (t, b) = ve_tables();
        let boosts = compute_boosts(&t, &b, &BoostParams::default());
        let ve = boosts.get("ve").expect("'ve' should be boosted");
        let n = ve[&'n'];
        assert!(n > 1.5, "delta for ('ve','n') was {n}");
        // 'r' is shared with the baseline, so it scores lower than 'n'
        let r = log_odds(&t, &b, "ve", 'r', 1.0);
        assert!(r < n);
        assert!(!ve.contains_key(&'r'));
        // 't' never follows "ve" in the target
        assert!(!ve.contains_key(&'t'));
    }

    #[test]
    fn test_threshold_and_min_count_respected() {
        let (t, b) = tables(
            &[("vouloir", 200), ("veux", 150), ("voila", 3), ("vous", 500), ("avoue", 60)],
            &[("vote", 400), ("love", 900), ("over", 700)],
        );
        let params = BoostParams {
            threshold: 0.5,
            top_k: 0,
            ..BoostParams::default()
        };
        let boosts = compute_boosts(&t, &b, &params);
        assert!(!boosts.is_empty());
        for (prefix, chars) in &boosts {
            assert!(prefix.len() >= params.min_prefix_len);
            assert!(prefix.len() <= params.max_prefix_len);
            for (&c, &v) in chars {
                assert!(v > params.threshold);
                assert!(t.count(prefix, c) >= params.min_target_count);
            }
        }
    }

    #[test]
    fn test_min_target_count_filters() {
        let (t, b) = ve_tables();
        let params = BoostParams {
            min_target_count: 100,
            ..BoostParams::default()
        };
        assert!(compute_boosts(&t, &b, &params).is_empty());
    }

    #[test]
    fn test_prefix_length_bounds() {
        let (t, b) = ve_tables();
        let params = BoostParams {
            min_prefix_len: 3,
            max_prefix_len: 3,
            top_k: 0,
            ..BoostParams::default()
        };
        let boosts = compute_boosts(&t, &b, &params);
        assert!(boosts.keys().all(|p| p.len() == 3));
        assert!(boosts.contains_key("ven"));
    }

    #[test]
    fn test_empty_target() {
        let (t, b) = tables(&[], &[("very", 1000)]);
        assert!(compute_boosts(&t, &b, &BoostParams::default()).is_empty());
    }

    #[test]
    fn test_trim_top_k() {
        let mut boosts = BoostMap::new();
        boosts.insert(
            "ab".to_string(),
            [('a', 2.0), ('b', 5.0), ('c', 3.0), ('d', 5.0)].into_iter().collect(),
        );
        boosts.insert("cd".to_string(), [('x', 1.7)].into_iter().collect());

        let trimmed = trim_top_k(boosts.clone(), 2);
        let ab: Vec<char> = trimmed["ab"].keys().copied().collect();
        assert_eq!(ab, vec!['b', 'd']);
        assert_eq!(trimmed["cd"].len(), 1);

        assert!(trim_top_k(boosts.clone(), 0).is_empty());
        assert_eq!(trim_top_k(boosts.clone(), 10), boosts);
    }

    #[test]
    fn test_top_k_option_is_independent() {
        let (t, b) = tables(
            &[("vache", 90), ("vague", 80), ("valse", 70), ("vaut", 60), ("vaxe", 50), ("vazy", 40)],
            &[("van", 1000), ("vanish", 800)],
        );
        let all = compute_boosts(
            &t,
            &b,
            &BoostParams {
                top_k: 0,
                ..BoostParams::default()
            },
        );
        let trimmed = compute_boosts(
            &t,
            &b,
            &BoostParams {
                top_k: 2,
                ..BoostParams::default()
            },
        );
        assert!(all["va"].len() > 2);
        assert_eq!(trimmed["va"].len(), 2);
        assert_eq!(trimmed, trim_top_k(all, 2));
    }

    #[test]
    fn test_deterministic() {
        let (t, b) = ve_tables();
        let p = BoostParams::default();
        assert_eq!(compute_boosts(&t, &b, &p), compute_boosts(&t, &b, &p));
    }
}
