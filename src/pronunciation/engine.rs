//! [`PronunciationEngine`] — English term → Vietnamese phonetic rendering.
//!
//! Resolution order for every position in the (normalised) term:
//!
//! 1. the longest known multi-word phrase starting there;
//! 2. an exact single-word rule;
//! 3. the algorithmic [`approximate`] fallback.
//!
//! When the fallback cannot handle a word the whole term is reported as
//! [`PronunciationError::UnknownTerm`] and the caller decides what to do.
//! The engine holds no mutable state, so the same term always produces the
//! same output for a given rule set.

use thiserror::Error;

use super::fallback::approximate;
use super::rules::{split_words, PronunciationRules};

// ---------------------------------------------------------------------------
// PronunciationError
// ---------------------------------------------------------------------------

/// Errors raised by the pronunciation engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PronunciationError {
    /// No rule matched and the fallback could not approximate the term.
    #[error("no confident transliteration for '{0}'")]
    UnknownTerm(String),
}

// ---------------------------------------------------------------------------
// Transliteration
// ---------------------------------------------------------------------------

/// Where a piece of a transliteration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    /// A multi-word phrase rule.
    Phrase,
    /// A single-word rule.
    Word,
    /// The algorithmic approximation.
    Fallback,
}

/// One matched span of the input term.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// The normalised English words covered by this span.
    pub term: String,
    /// Its phonetic rendering.
    pub text: String,
    pub source: MatchSource,
}

/// Result of transliterating a term.
#[derive(Debug, Clone, PartialEq)]
pub struct Transliteration {
    pub segments: Vec<Segment>,
}

impl Transliteration {
    /// The full rendering, segments joined by single spaces.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `true` when any span needed the algorithmic fallback.
    pub fn used_fallback(&self) -> bool {
        self.segments
            .iter()
            .any(|s| s.source == MatchSource::Fallback)
    }

    /// Normalised words that were approximated rather than looked up.
    pub fn fallback_terms(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .filter(|s| s.source == MatchSource::Fallback)
            .map(|s| s.term.as_str())
    }
}

// ---------------------------------------------------------------------------
// PronunciationEngine
// ---------------------------------------------------------------------------

/// Deterministic transliteration over an immutable [`PronunciationRules`].
///
/// # Example
/// ```rust
/// use meeting_codeswitch::pronunciation::{PronunciationEngine, PronunciationRules};
///
/// let mut rules = PronunciationRules::empty();
/// rules.insert("sprint", vec!["xờ pin".into()]);
/// rules.insert("sprint planning meeting", vec!["xờ pin pờ lán ninh mí tinh".into()]);
///
/// let engine = PronunciationEngine::new(rules);
/// let out = engine.transliterate("Sprint Planning Meeting").unwrap();
/// assert_eq!(out.text(), "xờ pin pờ lán ninh mí tinh");
/// ```
#[derive(Debug, Clone)]
pub struct PronunciationEngine {
    rules: PronunciationRules,
}

impl PronunciationEngine {
    /// Create an engine over the given rules.
    pub fn new(rules: PronunciationRules) -> Self {
        Self { rules }
    }

    /// Engine over the built-in rule set.
    pub fn builtin() -> Self {
        Self::new(PronunciationRules::builtin())
    }

    /// The underlying rule table.
    pub fn rules(&self) -> &PronunciationRules {
        &self.rules
    }

    /// Transliterate a word or phrase (greedy longest match, then fallback).
    pub fn transliterate(&self, term: &str) -> Result<Transliteration, PronunciationError> {
        let raw: Vec<&str> = split_words(term).collect();
        if raw.is_empty() {
            return Err(PronunciationError::UnknownTerm(term.to_string()));
        }
        let words: Vec<String> = raw.iter().map(|w| w.to_lowercase()).collect();

        let mut segments = Vec::new();
        let mut i = 0;
        while i < words.len() {
            let longest = self.rules.max_phrase_words().min(words.len() - i);
            let matched = (1..=longest).rev().find_map(|len| {
                let key = words[i..i + len].join(" ");
                self.rules
                    .lookup(&key)
                    .map(|text| (len, key.clone(), text.to_string()))
            });

            match matched {
                Some((len, key, text)) => {
                    let source = if len > 1 {
                        MatchSource::Phrase
                    } else {
                        MatchSource::Word
                    };
                    segments.push(Segment {
                        term: key,
                        text,
                        source,
                    });
                    i += len;
                }
                None => {
                    let text = approximate(raw[i])
                        .ok_or_else(|| PronunciationError::UnknownTerm(term.to_string()))?;
                    log::debug!("fallback transliteration: '{}' → '{}'", raw[i], text);
                    segments.push(Segment {
                        term: words[i].clone(),
                        text,
                        source: MatchSource::Fallback,
                    });
                    i += 1;
                }
            }
        }

        Ok(Transliteration { segments })
    }

    /// `true` when `candidate` is an accepted rendering of `term`: either
    /// listed in the rules or equal to the engine's own output.
    pub fn accepts(&self, term: &str, candidate: &str) -> bool {
        let candidate = candidate.trim().to_lowercase();
        if self.rules.candidates(term).iter().any(|c| *c == candidate) {
            return true;
        }
        self.transliterate(term)
            .map(|t| t.text() == candidate)
            .unwrap_or(false)
    }
}

impl Default for PronunciationEngine {
    fn default() -> Self {
        Self::builtin()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
