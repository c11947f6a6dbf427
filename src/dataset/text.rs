//! Word-bounded, case-insensitive term matching for rebuilding `spoken`.
//!
//! A match only counts when the characters on both sides are not letters or
//! digits, so `"test"` is found in `"unit test."` but not in `"testing"`.
//! Letters include Vietnamese diacritics, which keeps `"code"` from matching
//! inside `"cốt"`.

use regex::{Regex, RegexBuilder};

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

fn pattern(term: &str) -> Option<Regex> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Byte ranges of word-bounded occurrences of `term` in `haystack`.
pub fn find_word(haystack: &str, term: &str) -> Vec<(usize, usize)> {
    let Some(re) = pattern(term) else {
        return Vec::new();
    };
    re.find_iter(haystack)
        .filter(|m| {
            let before = haystack[..m.start()].chars().next_back();
            let after = haystack[m.end()..].chars().next();
            !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
        })
        .map(|m| (m.start(), m.end()))
        .collect()
}

/// Replace every word-bounded occurrence of `term` with `replacement`.
pub fn replace_word(haystack: &str, term: &str, replacement: &str) -> String {
    let ranges = find_word(haystack, term);
    if ranges.is_empty() {
        return haystack.to_string();
    }

    let mut out = String::with_capacity(haystack.len() + replacement.len() * ranges.len());
    let mut last = 0;
    for (start, end) in ranges {
        out.push_str(&haystack[last..start]);
        out.push_str(replacement);
        last = end;
    }
    out.push_str(&haystack[last..]);
    out
}

/// `true` when `a` and `b` have the same tokens, ignoring case and
/// surrounding punctuation.
pub fn same_tokens(a: &str, b: &str) -> bool {
    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    tokens(&a) == tokens(&b)
}

/// Whitespace-separated tokens with surrounding punctuation removed.
pub fn tokens(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .collect()
}
