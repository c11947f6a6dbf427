//! Pronunciation rule table.
//!
//! [`PronunciationRules`] maps a normalised English term (lowercase, trimmed,
//! hyphens and underscores folded into single spaces) to one or more
//! Vietnamese phonetic renderings.  The first candidate is canonical.
//!
//! Two JSON layouts are accepted:
//!
//! ```json
//! { "meeting": "mí tinh", "sprint planning meeting": ["xờ pin pờ lán ninh mí tinh"] }
//! ```
//!
//! ```json
//! {
//!   "common_words": { "meeting": "mí tinh" },
//!   "special_cases": {
//!     "acronyms":       { "API": "ây pi ai" },
//!     "compound_words": { "follow-up": "pho lô áp" }
//!   }
//! }
//! ```
//!
//! Entries whose value is empty or not a string / list of strings are skipped
//! with a warning; they never abort loading.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::config::ConfigError;

/// Rule set compiled into the binary, used when no rules file is configured.
const BUILTIN_RULES_JSON: &str = include_str!("../../data/pronunciation_rules.json");

// ---------------------------------------------------------------------------
// Normalisation
// ---------------------------------------------------------------------------

/// Normalise a term for lookup.
///
/// Lowercases, treats `-` and `_` as word separators, strips punctuation
/// from both ends of every word and collapses whitespace.
///
/// ```
/// use meeting_codeswitch::pronunciation::normalize_term;
///
/// assert_eq!(normalize_term("  Sprint   Planning-Meeting, "), "sprint planning meeting");
/// ```
pub fn normalize_term(term: &str) -> String {
    split_words(term)
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a raw term into words, keeping the original casing.
pub(crate) fn split_words(term: &str) -> impl Iterator<Item = &str> {
    term.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
}

// ---------------------------------------------------------------------------
// PronunciationRules
// ---------------------------------------------------------------------------

/// Immutable lookup table from normalised English terms to phonetic strings.
#[derive(Debug, Clone, Default)]
pub struct PronunciationRules {
    entries: HashMap<String, Vec<String>>,
    /// Word count of the longest known phrase; bounds the longest-match scan.
    max_phrase_words: usize,
}

impl PronunciationRules {
    /// An empty rule set (every lookup goes to the fallback).
    pub fn empty() -> Self {
        Self::default()
    }

    /// The rule set shipped with the crate.
    pub fn builtin() -> Self {
        // The embedded file is covered by tests; a parse failure here would
        // only drop to an empty table.
        Self::from_json_str(BUILTIN_RULES_JSON).unwrap_or_else(|e| {
            log::error!("built-in pronunciation rules are malformed: {e}");
            Self::empty()
        })
    }

    /// Load rules from a JSON file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Rules`] when it is not a JSON object.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let rules = Self::from_json_str(&data)?;
        log::info!(
            "loaded {} pronunciation rules from {}",
            rules.len(),
            path.display()
        );
        Ok(rules)
    }

    /// Parse rules from a JSON document in either supported layout.
    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let root: Value =
            serde_json::from_str(data).map_err(|e| ConfigError::Rules(e.to_string()))?;
        let Value::Object(map) = root else {
            return Err(ConfigError::Rules(
                "top-level value must be a JSON object".into(),
            ));
        };

        let mut rules = Self::empty();

        match map.get("common_words") {
            Some(Value::Object(common)) => {
                rules.extend_from(common);
                if let Some(Value::Object(special)) = map.get("special_cases") {
                    for section in ["acronyms", "compound_words"] {
                        if let Some(Value::Object(entries)) = special.get(section) {
                            rules.extend_from(entries);
                        }
                    }
                }
            }
            _ => rules.extend_from(&map),
        }

        Ok(rules)
    }

    fn extend_from(&mut self, map: &serde_json::Map<String, Value>) {
        for (term, value) in map {
            let candidates: Vec<String> = match value {
                Value::String(s) => vec![s.clone()],
                Value::Array(items) => items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            };
            if !self.insert(term, candidates) {
                log::warn!("skipping malformed pronunciation rule for '{term}'");
            }
        }
    }

    /// Add a rule.  Returns `false` (and leaves the table unchanged) when the
    /// term normalises to nothing or no non-empty candidate remains.
    pub fn insert(&mut self, term: &str, candidates: Vec<String>) -> bool {
        let key = normalize_term(term);
        let candidates: Vec<String> = candidates
            .into_iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();

        if key.is_empty() || candidates.is_empty() {
            return false;
        }

        self.max_phrase_words = self.max_phrase_words.max(key.split(' ').count());
        self.entries.insert(key, candidates);
        true
    }

    /// Canonical rendering for an already-normalised key.
    pub fn lookup(&self, normalized: &str) -> Option<&str> {
        self.entries
            .get(normalized)
            .and_then(|c| c.first())
            .map(String::as_str)
    }

    /// All accepted renderings for a term (normalised internally).
    pub fn candidates(&self, term: &str) -> &[String] {
        self.entries
            .get(&normalize_term(term))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Word count of the longest phrase in the table.
    pub fn max_phrase_words(&self) -> usize {
        self.max_phrase_words
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn builtin_rules_parse_and_are_non_empty() {
        let rules = PronunciationRules::from_json_str(BUILTIN_RULES_JSON).expect("builtin");
        assert!(!rules.is_empty());
        assert_eq!(rules.lookup("team"), Some("tím"));
        assert!(rules.max_phrase_words() >= 3);
    }

    #[test]
    fn flat_layout_accepts_string_and_list_values() {
        let rules = PronunciationRules::from_json_str(
            r#"{ "Meeting": "mí tinh", "deadline": ["đét lai", "đết lai"] }"#,
        )
        .unwrap();

        assert_eq!(rules.lookup("meeting"), Some("mí tinh"));
        assert_eq!(rules.lookup("deadline"), Some("đét lai"));
        assert_eq!(rules.candidates("DEADLINE").len(), 2);
    }

    #[test]
    fn sectioned_layout_merges_all_sections() {
        let rules = PronunciationRules::from_json_str(
            r#"{
                "common_words": { "meeting": "mí tinh" },
                "special_cases": {
                    "acronyms": { "API": "ây pi ai" },
                    "compound_words": { "follow-up": "pho lô áp" }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(rules.len(), 3);
        assert_eq!(rules.lookup("api"), Some("ây pi ai"));
        assert_eq!(rules.lookup("follow up"), Some("pho lô áp"));
        assert_eq!(rules.max_phrase_words(), 2);
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let rules = PronunciationRules::from_json_str(
            r#"{ "team": "tím", "bad": 42, "empty": "", "blank": ["  "], "  ": "x" }"#,
        )
        .unwrap();

        assert_eq!(rules.len(), 1);
        assert_eq!(rules.lookup("team"), Some("tím"));
        assert!(rules.lookup("bad").is_none());
    }

    #[test]
    fn non_object_document_is_a_config_error() {
        assert!(matches!(
            PronunciationRules::from_json_str("[1, 2, 3]"),
            Err(ConfigError::Rules(_))
        ));
        assert!(matches!(
            PronunciationRules::from_json_str("{ not json"),
            Err(ConfigError::Rules(_))
        ));
    }

    #[test]
    fn load_from_missing_file_is_io_error() {
        let dir = tempdir().expect("temp dir");
        let err = PronunciationRules::load_from(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("rules.json");
        std::fs::write(&path, r#"{ "sprint": "xờ pin" }"#).unwrap();

        let rules = PronunciationRules::load_from(&path).unwrap();
        assert_eq!(rules.lookup("sprint"), Some("xờ pin"));
    }

    #[test]
    fn normalisation_folds_case_separators_and_punctuation() {
        assert_eq!(normalize_term("API"), "api");
        assert_eq!(normalize_term("follow-up"), "follow up");
        assert_eq!(normalize_term("(Sprint)  Planning, "), "sprint planning");
        assert_eq!(normalize_term("   "), "");
    }
}
