use tracing::warn;

use super::FrequencyCorpus;

pub const BINARY_MAGIC: &[u8; 4] = b"CKDT";
const BINARY_VERSION: u16 = 2;
/// magic(4) + version(2) + lang(2) + word_count(4) + node_count(4) + reserved(24).
pub const BINARY_HEADER_SIZE: usize = 4 + 2 + 2 + 4 + 4 + 24;

/// Parse a tagged binary dictionary.
///
/// A wrong magic yields an empty corpus. Boost computation degrades
/// gracefully with less data, so this is a warning rather than an error.
pub(super) fn parse_binary(data: &[u8]) -> FrequencyCorpus {
    let mut corpus = FrequencyCorpus::new();
    if data.len() < BINARY_HEADER_SIZE || &data[..4] != BINARY_MAGIC {
        warn!(
            magic = ?String::from_utf8_lossy(&data[..data.len().min(4)]),
            "invalid binary corpus header, treating as empty"
        );
        return corpus;
    }

    let lang = String::from_utf8_lossy(&data[6..8]);
    let lang = lang.trim_end_matches('\0');
    let declared = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);

    let mut pos = BINARY_HEADER_SIZE;
    let mut skipped = 0u64;
    while pos < data.len() {
        let len = data[pos] as usize;
        pos += 1;
        if len == 0 {
            continue;
        }
        // word bytes + trailing frequency byte
        let Some(record) = data.get(pos..pos + len + 1) else {
            warn!(offset = pos - 1, "truncated record at end of binary corpus");
            break;
        };
        pos += len + 1;

        let Ok(word) = std::str::from_utf8(&record[..len]) else {
            warn!(offset = pos - len - 2, "skipping non-UTF-8 word record");
            skipped += 1;
            continue;
        };
        if !corpus.insert(word, u32::from(record[len])) {
            skipped += 1;
        }
    }

    if corpus.len() as u64 + skipped < u64::from(declared) {
        warn!(
            lang,
            declared,
            read = corpus.len(),
            "binary corpus holds fewer words than its header declares"
        );
    }
    corpus
}

/// Encode words in the tagged binary format. Words longer than 255 bytes
/// are skipped. The node count field is left zero.
pub fn encode_binary(lang: &str, words: &[(&str, u8)]) -> Vec<u8> {
    let words: Vec<&(&str, u8)> = words
        .iter()
        .filter(|(w, _)| !w.is_empty() && w.len() <= u8::MAX as usize)
        .collect();

    let mut buf = Vec::with_capacity(BINARY_HEADER_SIZE + words.len() * 8);
    buf.extend_from_slice(BINARY_MAGIC);
    buf.extend_from_slice(&BINARY_VERSION.to_le_bytes());
    let mut lang_bytes = [0u8; 2];
    for (dst, src) in lang_bytes.iter_mut().zip(lang.bytes()) {
        *dst = src;
    }
    buf.extend_from_slice(&lang_bytes);
    buf.extend_from_slice(&(words.len() as u32).to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&[0u8; 24]);
    for (word, freq) in words {
        buf.push(word.len() as u8);
        buf.extend_from_slice(word.as_bytes());
        buf.push(*freq);
    }
    buf
}
