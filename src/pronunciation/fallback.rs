//! Algorithmic phonetic approximation for words missing from the rule table.
//!
//! The approximation is deliberately simple and fully deterministic:
//!
//! * digits are read as Vietnamese numerals (`3` → `ba`);
//! * short all-caps tokens are spelled letter by letter (`API` → `ây pi ai`);
//! * anything else is cut into letter clusters by a greedy longest-pattern
//!   scan, the clusters are regrouped into syllables (onset + vowel + allowed
//!   final consonant), and consonants that cannot attach to a vowel become a
//!   syllable of their own with `ờ` (`s` → `xờ`).
//!
//! Words containing characters outside ASCII letters and digits are not
//! approximated at all; the caller gets `None`.

/// Maximum length of a token treated as an acronym and spelled out.
const MAX_ACRONYM_LEN: usize = 5;

const DIGITS: [&str; 10] = [
    "không", "một", "hai", "ba", "bốn", "năm", "sáu", "bảy", "tám", "chín",
];

/// Vietnamese reading of English letter names, `a` through `z`.
const LETTER_NAMES: [&str; 26] = [
    "ây", "bi", "xi", "đi", "i", "ép", "gi", "hát", "ai", "giây", "cây", "eo", "em", "en",
    "âu", "pi", "kiu", "a", "ét", "ti", "diu", "vi", "đắp bờ liu", "ích", "oai", "dét",
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Consonant,
    Vowel,
    /// A cluster that already forms a complete syllable.
    Whole,
}

/// Greedy pattern table, longest patterns first.
const PATTERNS: &[(&str, &str, Kind)] = &[
    ("tion", "sần", Kind::Whole),
    ("sion", "sần", Kind::Whole),
    ("ment", "mần", Kind::Whole),
    ("ture", "chờ", Kind::Whole),
    ("ness", "nét", Kind::Whole),
    ("ing", "inh", Kind::Whole),
    ("ble", "bồ", Kind::Whole),
    ("sh", "s", Kind::Consonant),
    ("ch", "ch", Kind::Consonant),
    ("th", "th", Kind::Consonant),
    ("ph", "ph", Kind::Consonant),
    ("ck", "c", Kind::Consonant),
    ("qu", "qu", Kind::Consonant),
    ("wh", "qu", Kind::Consonant),
    ("gh", "g", Kind::Consonant),
    ("kn", "n", Kind::Consonant),
    ("ng", "ng", Kind::Consonant),
    ("ee", "i", Kind::Vowel),
    ("ea", "i", Kind::Vowel),
    ("oo", "u", Kind::Vowel),
    ("ou", "ao", Kind::Vowel),
    ("ow", "ao", Kind::Vowel),
    ("ai", "ây", Kind::Vowel),
    ("ay", "ây", Kind::Vowel),
    ("ei", "ây", Kind::Vowel),
    ("oi", "oi", Kind::Vowel),
    ("oy", "oi", Kind::Vowel),
    ("au", "o", Kind::Vowel),
    ("aw", "o", Kind::Vowel),
    ("ie", "ai", Kind::Vowel),
    ("ue", "iu", Kind::Vowel),
    ("er", "ơ", Kind::Vowel),
    ("ir", "ơ", Kind::Vowel),
    ("ur", "ơ", Kind::Vowel),
    ("ar", "a", Kind::Vowel),
    ("or", "o", Kind::Vowel),
    ("a", "a", Kind::Vowel),
    ("e", "e", Kind::Vowel),
    ("i", "i", Kind::Vowel),
    ("o", "o", Kind::Vowel),
    ("u", "u", Kind::Vowel),
    ("y", "i", Kind::Vowel),
    ("b", "b", Kind::Consonant),
    ("c", "c", Kind::Consonant),
    ("d", "đ", Kind::Consonant),
    ("f", "ph", Kind::Consonant),
    ("g", "g", Kind::Consonant),
    ("h", "h", Kind::Consonant),
    ("j", "gi", Kind::Consonant),
    ("k", "c", Kind::Consonant),
    ("l", "l", Kind::Consonant),
    ("m", "m", Kind::Consonant),
    ("n", "n", Kind::Consonant),
    ("p", "p", Kind::Consonant),
    ("q", "c", Kind::Consonant),
    ("r", "r", Kind::Consonant),
    ("s", "x", Kind::Consonant),
    ("t", "t", Kind::Consonant),
    ("v", "v", Kind::Consonant),
    ("w", "qu", Kind::Consonant),
    ("x", "x", Kind::Consonant),
    ("z", "d", Kind::Consonant),
];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Best-effort phonetic approximation of a single English word.
///
/// Returns `None` when the word is empty or contains characters other than
/// ASCII letters and digits.
///
/// ```
/// use meeting_codeswitch::pronunciation::approximate;
///
/// assert_eq!(approximate("API").as_deref(), Some("ây pi ai"));
/// assert_eq!(approximate("Q3").as_deref(), Some("kiu ba"));
/// assert!(approximate("café").is_none());
/// ```
pub fn approximate(word: &str) -> Option<String> {
    if word.is_empty() || !word.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    let mut syllables = Vec::new();
    for run in alnum_runs(word) {
        if run.chars().all(|c| c.is_ascii_digit()) {
            syllables.extend(run.bytes().map(|b| DIGITS[usize::from(b - b'0')].to_string()));
        } else if is_acronym(run, word) {
            syllables.extend(spell(run));
        } else {
            syllables.extend(syllabify(&run.to_ascii_lowercase()));
        }
    }

    if syllables.is_empty() {
        None
    } else {
        Some(syllables.join(" "))
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Split a word into maximal runs of letters and of digits.
fn alnum_runs(word: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let bytes = word.as_bytes();
    for i in 1..=bytes.len() {
        if i == bytes.len() || bytes[i].is_ascii_digit() != bytes[start].is_ascii_digit() {
            runs.push(&word[start..i]);
            start = i;
        }
    }
    runs
}

/// Upper-case letter runs are spelled; so are single letters glued to digits.
fn is_acronym(run: &str, word: &str) -> bool {
    let upper = run.chars().all(|c| c.is_ascii_uppercase());
    (upper && run.len() <= MAX_ACRONYM_LEN) || (run.len() == 1 && run.len() < word.len())
}

fn spell(run: &str) -> impl Iterator<Item = String> + '_ {
    run.bytes()
        .map(|b| LETTER_NAMES[usize::from(b.to_ascii_lowercase() - b'a')].to_string())
}

/// Greedy longest-pattern scan into clusters.
fn clusters(word: &str) -> Vec<(&'static str, Kind)> {
    let mut out = Vec::new();
    let mut rest = word;
    while !rest.is_empty() {
        // Every ASCII letter has a single-letter pattern, so a match exists.
        match PATTERNS.iter().find(|(pat, _, _)| rest.starts_with(pat)) {
            Some(&(pat, text, kind)) => {
                out.push((text, kind));
                rest = &rest[pat.len()..];
            }
            None => rest = &rest[1..],
        }
    }
    out
}

/// Finals allowed at the end of a Vietnamese syllable, with substitutions.
fn final_for(consonant: &str) -> Option<&'static str> {
    match consonant {
        "c" | "g" => Some("c"),
        "ch" => Some("ch"),
        "m" => Some("m"),
        "n" => Some("n"),
        "ng" => Some("ng"),
        "p" | "b" => Some("p"),
        "t" | "đ" => Some("t"),
        _ => None,
    }
}

fn syllabify(word: &str) -> Vec<String> {
    let units = clusters(word);
    let mut out = Vec::new();
    let mut i = 0;

    while i < units.len() {
        let (text, kind) = units[i];
        match kind {
            Kind::Whole => {
                out.push(text.to_string());
                i += 1;
            }
            Kind::Consonant => {
                let start = i;
                while i < units.len() && units[i].1 == Kind::Consonant {
                    i += 1;
                }
                let run = &units[start..i];
                if i < units.len() && units[i].1 == Kind::Vowel {
                    let (onset, loose) = run.split_last().map_or(("", run), |(o, l)| (o.0, l));
                    out.extend(loose.iter().map(|(c, _)| format!("{c}ờ")));
                    let (syllable, next) = vowel_syllable(&units, i, onset);
                    out.push(syllable);
                    i = next;
                } else {
                    out.extend(run.iter().map(|(c, _)| format!("{c}ờ")));
                }
            }
            Kind::Vowel => {
                let (syllable, next) = vowel_syllable(&units, i, "");
                out.push(syllable);
                i = next;
            }
        }
    }

    out
}

/// Build one syllable from `onset` + the vowel run at `i` + an optional
/// final.  Returns the syllable and the index after it.
fn vowel_syllable(units: &[(&'static str, Kind)], mut i: usize, onset: &str) -> (String, usize) {
    let mut syllable = onset.to_string();
    while i < units.len() && units[i].1 == Kind::Vowel {
        syllable.push_str(units[i].0);
        i += 1;
    }

    // A consonant followed by a vowel starts the next syllable instead.
    let next_is_vowel = units.get(i + 1).is_some_and(|u| u.1 == Kind::Vowel);
    if let Some(&(consonant, Kind::Consonant)) = units.get(i) {
        if !next_is_vowel {
            if let Some(fin) = final_for(consonant) {
                syllable.push_str(fin);
                i += 1;
            }
        }
    }

    (syllable, i)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acronyms_are_spelled() {
        assert_eq!(approximate("API").as_deref(), Some("ây pi ai"));
        assert_eq!(approximate("HR").as_deref(), Some("hát a"));
    }

    #[test]
    fn digits_are_read_as_numerals() {
        assert_eq!(approximate("2024").as_deref(), Some("hai không hai bốn"));
        assert_eq!(approximate("Q3").as_deref(), Some("kiu ba"));
    }

    #[test]
    fn simple_words_are_syllabified() {
        assert_eq!(approximate("team").as_deref(), Some("tim"));
        assert_eq!(approximate("sprint").as_deref(), Some("xờ pờ rin tờ"));
        assert_eq!(approximate("meeting").as_deref(), Some("mit inh"));
    }

    #[test]
    fn suffix_patterns_form_whole_syllables() {
        let out = approximate("station").unwrap();
        assert!(out.ends_with("sần"), "got {out}");
    }

    #[test]
    fn output_is_lowercase_and_non_empty() {
        for word in ["Refactor", "Backend", "Microservice", "Kubernetes", "x"] {
            let out = approximate(word).unwrap();
            assert!(!out.is_empty());
            assert_eq!(out, out.to_lowercase(), "{word} → {out}");
        }
    }

    #[test]
    fn non_ascii_or_punctuated_words_are_rejected() {
        assert!(approximate("").is_none());
        assert!(approximate("café").is_none());
        assert!(approximate("c++").is_none());
        assert!(approximate("họp").is_none());
    }

    #[test]
    fn approximation_is_deterministic() {
        let first = approximate("Refactoring");
        for _ in 0..10 {
            assert_eq!(approximate("Refactoring"), first);
        }
    }
}
