//! Word normalization to the fixed `a..=z` alphabet.
//!
//! Corpus loading and the on-device decoder must agree on this mapping
//! exactly, otherwise generated prefixes never reach the compiled trie.

use unicode_normalization::UnicodeNormalization;

/// Letters that NFD does not decompose into a plain Latin base letter.
/// Looked up after lower-casing, so only lower-case forms are listed.
const SPECIAL_REPLACEMENTS: &[(char, &str)] = &[
    ('ß', "ss"),
    ('ø', "o"),
    ('ð', "d"),
    ('þ', "th"),
    ('æ', "ae"),
    ('œ', "oe"),
    ('ł', "l"),
    ('đ', "d"),
    ('ı', "i"),
    ('ħ', "h"),
];

/// Combining Diacritical Marks block (U+0300..U+036F).
pub fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&c)
}

/// Plain lower-case ASCII letter, the only characters the automaton stores.
pub fn is_plain_letter(c: char) -> bool {
    c.is_ascii_lowercase()
}

/// Map a plain letter to its edge key (0 = 'a' .. 25 = 'z').
pub fn char_index(c: char) -> Option<u8> {
    if is_plain_letter(c) {
        Some(c as u8 - b'a')
    } else {
        None
    }
}

/// Inverse of [`char_index`].
pub fn index_char(idx: u8) -> Option<char> {
    if idx < 26 {
        Some((b'a' + idx) as char)
    } else {
        None
    }
}

/// Normalize a word: lower-case, substitute special letters, strip
/// combining marks and drop everything outside `a..=z`.
///
/// Never fails; characters without a Latin base letter are omitted.
pub fn normalize(word: &str) -> String {
    let mut substituted = String::with_capacity(word.len());
    for c in word.chars().flat_map(char::to_lowercase) {
        match SPECIAL_REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => substituted.push_str(to),
            None => substituted.push(c),
        }
    }
    substituted
        .nfd()
        .filter(|&c| !is_combining_mark(c) && is_plain_letter(c))
        .collect()
}

/// Whether normalization changes `word` (ignoring case).
pub fn has_accents(word: &str) -> bool {
    normalize(word) != word.to_lowercase()
}
