use serde_json::Value;
use tracing::warn;

use super::FrequencyCorpus;

/// Parse a `{word: frequency}` JSON object.
///
/// Entries whose value is not a positive integer are skipped. A document
/// that is not an object yields an empty corpus.
pub(super) fn parse_json(data: &[u8]) -> FrequencyCorpus {
    let mut corpus = FrequencyCorpus::new();
    let map = match serde_json::from_slice::<Value>(data) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!("JSON corpus is not an object, treating as empty");
            return corpus;
        }
        Err(e) => {
            warn!("unreadable JSON corpus, treating as empty: {e}");
            return corpus;
        }
    };

    let mut skipped = 0u64;
    for (word, value) in &map {
        let Some(freq) = value.as_u64().filter(|&f| f > 0) else {
            warn!(word = word.as_str(), %value, "skipping malformed frequency");
            skipped += 1;
            continue;
        };
        let weight = u32::try_from(freq).unwrap_or(u32::MAX);
        if !corpus.insert(word, weight) {
            skipped += 1;
        }
    }
    if skipped > 0 {
        warn!(skipped, total = map.len(), "skipped JSON corpus entries");
    }
    corpus
}
