//! Record invariants and dataset-level statistics.
//!
//! [`Validator::validate_record`] evaluates every check independently and
//! returns all violations; a record is valid iff the list is empty.
//! [`Validator::validate_dataset`] aggregates a [`DatasetStats`] report.
//! Neither mutates its input.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::config::PronunciationConfig;
use crate::pronunciation::PronunciationEngine;

use super::record::{Difficulty, Record};
use super::repair::rebuild_spoken;
use super::text;

/// Number of per-record error entries printed by the report.
const REPORTED_ERRORS: usize = 5;

// ---------------------------------------------------------------------------
// Violation
// ---------------------------------------------------------------------------

/// One broken record invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum Violation {
    #[error("origin is empty")]
    EmptyOrigin,

    #[error("en_word is empty")]
    NoEnglishWords,

    #[error("en_word[{index}] is empty")]
    EmptyEnglishWord { index: usize },

    #[error("en_word has {en} entries but vi_spoken_word has {vi}")]
    LengthMismatch { en: usize, vi: usize },

    #[error("transliteration of '{word}' is empty")]
    EmptyTransliteration { word: String },

    #[error("'{word}' does not occur in origin")]
    WordNotInOrigin { word: String },

    #[error("spoken still contains English word '{word}'")]
    ResidualEnglish { word: String },

    #[error("spoken is not lowercase")]
    SpokenNotLowercase,

    #[error("transliteration '{transliteration}' does not occur in spoken")]
    TransliterationNotInSpoken { transliteration: String },

    #[error("spoken differs from origin with English words replaced (expected '{expected}')")]
    SpokenDiverges { expected: String },

    #[error("phrase '{phrase}' is not a contiguous run of en_word")]
    PhraseNotContiguous { phrase: String },

    #[error("easy record has multi-word phrase '{phrase}'")]
    MultiWordPhraseInEasy { phrase: String },

    #[error("hard record has no multi-word phrase")]
    HardWithoutPhrase,

    #[error("'{word}' rendered as '{found}', expected one of the rule candidates")]
    TransliterationMismatch { word: String, found: String },
}

/// Outcome of checking one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub ok: bool,
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            ok: violations.is_empty(),
            violations,
        }
    }
}

// ---------------------------------------------------------------------------
// DatasetStats
// ---------------------------------------------------------------------------

/// Violations of one record in a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordErrors {
    /// Zero-based position in the dataset.
    pub index: usize,
    pub violations: Vec<Violation>,
}

/// Aggregate report over a sequence of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetStats {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    /// Valid records per `type` label.
    pub type_distribution: BTreeMap<Difficulty, usize>,
    /// Mean `en_word` length over valid records; `0.0` when none are valid.
    pub mean_en_words: f64,
    /// Mean `origin` length in characters over valid records.
    pub mean_origin_chars: f64,
    pub errors: Vec<RecordErrors>,
}

impl fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Records:            {}", self.total)?;
        writeln!(f, "Valid:              {}", self.valid)?;
        writeln!(f, "Invalid:            {}", self.invalid)?;
        let distribution = Difficulty::ALL
            .iter()
            .map(|d| format!("{d}={}", self.type_distribution.get(d).copied().unwrap_or(0)))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(f, "Type distribution:  {distribution}")?;
        writeln!(f, "Mean en_word count: {:.2}", self.mean_en_words)?;
        write!(f, "Mean origin length: {:.1} chars", self.mean_origin_chars)?;

        if !self.errors.is_empty() {
            write!(f, "\nErrors (first {}):", REPORTED_ERRORS.min(self.errors.len()))?;
            for entry in self.errors.iter().take(REPORTED_ERRORS) {
                let joined = entry
                    .violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "\n  #{}: {joined}", entry.index)?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Checks records against the dataset invariants.
///
/// With an engine attached ([`Validator::strict`]) transliterations of terms
/// that have rule entries must also match one of the rule candidates.
///
/// ```rust
/// use meeting_codeswitch::dataset::{Difficulty, Record, Validator};
///
/// let record = Record {
///     origin: "Team cần review code".into(),
///     spoken: "tím cần ri viu cốt".into(),
///     en_word: vec!["Team".into(), "review".into(), "code".into()],
///     vi_spoken_word: vec!["tím".into(), "ri viu".into(), "cốt".into()],
///     kind: Difficulty::Easy,
///     en_phrase: vec!["Team".into(), "review".into(), "code".into()],
/// };
/// assert!(Validator::new().validate_record(&record).ok);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Validator {
    engine: Option<Arc<PronunciationEngine>>,
}

impl Validator {
    /// Structural and cross-field checks only.
    pub fn new() -> Self {
        Self { engine: None }
    }

    /// Also cross-check transliterations against the engine's rules.
    pub fn strict(engine: Arc<PronunciationEngine>) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    /// Strict when `pronunciation.strict` is set.
    pub fn from_config(config: &PronunciationConfig, engine: Arc<PronunciationEngine>) -> Self {
        if config.strict {
            Self::strict(engine)
        } else {
            Self::new()
        }
    }

    /// Check one record.
    pub fn validate_record(&self, record: &Record) -> ValidationResult {
        let mut v = Vec::new();

        if record.origin.trim().is_empty() {
            v.push(Violation::EmptyOrigin);
        }
        if record.en_word.is_empty() {
            v.push(Violation::NoEnglishWords);
        }
        if record.en_word.len() != record.vi_spoken_word.len() {
            v.push(Violation::LengthMismatch {
                en: record.en_word.len(),
                vi: record.vi_spoken_word.len(),
            });
        }

        let origin_lower = record.origin.to_lowercase();
        let spoken_lower = record.spoken.to_lowercase();
        for (index, word) in record.en_word.iter().enumerate() {
            let word = word.trim();
            if word.is_empty() {
                v.push(Violation::EmptyEnglishWord { index });
                continue;
            }
            if !origin_lower.contains(&word.to_lowercase()) {
                v.push(Violation::WordNotInOrigin { word: word.into() });
            }
            if spoken_lower.contains(&word.to_lowercase()) {
                v.push(Violation::ResidualEnglish { word: word.into() });
            }
        }

        if record.spoken != record.spoken.to_lowercase() {
            v.push(Violation::SpokenNotLowercase);
        }

        for (word, vi) in record.en_word.iter().zip(&record.vi_spoken_word) {
            let vi = vi.trim();
            if vi.is_empty() {
                v.push(Violation::EmptyTransliteration {
                    word: word.trim().into(),
                });
            } else if !spoken_lower.contains(&vi.to_lowercase()) {
                v.push(Violation::TransliterationNotInSpoken {
                    transliteration: vi.into(),
                });
            }
        }

        let complete = !record.en_word.is_empty()
            && record.en_word.len() == record.vi_spoken_word.len()
            && record
                .en_word
                .iter()
                .chain(&record.vi_spoken_word)
                .all(|w| !w.trim().is_empty());
        if complete {
            let expected = rebuild_spoken(&record.origin, &record.en_word, &record.vi_spoken_word);
            if !text::same_tokens(&record.spoken, &expected) {
                v.push(Violation::SpokenDiverges { expected });
            }
        }

        self.check_phrases(record, &mut v);
        self.check_rules(record, &mut v);

        ValidationResult::from_violations(v)
    }

    fn check_phrases(&self, record: &Record, v: &mut Vec<Violation>) {
        let words: Vec<String> = record
            .en_word
            .iter()
            .map(|w| w.trim().to_lowercase())
            .collect();

        for phrase in &record.en_phrase {
            let parts: Vec<String> = phrase.split_whitespace().map(str::to_lowercase).collect();
            let contiguous =
                !parts.is_empty() && words.windows(parts.len()).any(|window| window == parts.as_slice());
            if !contiguous {
                v.push(Violation::PhraseNotContiguous {
                    phrase: phrase.clone(),
                });
            }
            if record.kind == Difficulty::Easy && parts.len() > 1 {
                v.push(Violation::MultiWordPhraseInEasy {
                    phrase: phrase.clone(),
                });
            }
        }

        if record.kind == Difficulty::Hard && !record.has_multi_word_phrase() {
            v.push(Violation::HardWithoutPhrase);
        }
    }

    fn check_rules(&self, record: &Record, v: &mut Vec<Violation>) {
        let Some(engine) = &self.engine else {
            return;
        };
        for (word, vi) in record.en_word.iter().zip(&record.vi_spoken_word) {
            let known = !engine.rules().candidates(word).is_empty();
            if known && !vi.trim().is_empty() && !engine.accepts(word, vi) {
                v.push(Violation::TransliterationMismatch {
                    word: word.trim().into(),
                    found: vi.trim().into(),
                });
            }
        }
    }

    /// Check every record and aggregate the report.  An empty input yields
    /// all-zero statistics.
    pub fn validate_dataset(&self, records: &[Record]) -> DatasetStats {
        let mut stats = DatasetStats {
            total: records.len(),
            ..DatasetStats::default()
        };
        if records.is_empty() {
            return stats;
        }

        let mut en_words = 0usize;
        let mut origin_chars = 0usize;
        for (index, record) in records.iter().enumerate() {
            let result = self.validate_record(record);
            if result.ok {
                stats.valid += 1;
                *stats.type_distribution.entry(record.kind).or_insert(0) += 1;
                en_words += record.en_word.len();
                origin_chars += record.origin.chars().count();
            } else {
                stats.invalid += 1;
                stats.errors.push(RecordErrors {
                    index,
                    violations: result.violations,
                });
            }
        }

        if stats.valid > 0 {
            stats.mean_en_words = en_words as f64 / stats.valid as f64;
            stats.mean_origin_chars = origin_chars as f64 / stats.valid as f64;
        }
        stats
    }
}

/// [`Validator::validate_record`] without rule cross-checks.
pub fn validate_record(record: &Record) -> ValidationResult {
    Validator::new().validate_record(record)
}

/// [`Validator::validate_dataset`] without rule cross-checks.
pub fn validate_dataset(records: &[Record]) -> DatasetStats {
    Validator::new().validate_dataset(records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
