//! Turning a decoded [`Candidate`] into a complete [`Record`].
//!
//! [`ResponseProcessor`] fills in what the generator left out or got
//! obviously wrong, using the pronunciation engine:
//!
//! * transliterations that are missing, empty, or just the English word again
//!   are replaced with the engine's rendering;
//! * `spoken` is always rebuilt from `origin`, so the Vietnamese words are
//!   exactly those of `origin`;
//! * `en_phrase` is derived from runs of adjacent English tokens when absent.
//!
//! Nothing here decides whether the result is acceptable; that is the
//! validator's job.

use std::sync::Arc;

use crate::pronunciation::PronunciationEngine;

use super::parse::{parse_response, Candidate, ParseError};
use super::record::{Difficulty, Record};
use super::text;

/// A completed record plus what the repair step had to do to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub record: Record,
    /// English words whose transliteration was replaced by the engine.
    pub auto_fixed: Vec<String>,
    /// Terms the engine could only render through its syllable fallback.
    pub fallback_terms: Vec<String>,
}

/// Parses responses and completes them into records.
#[derive(Debug, Clone)]
pub struct ResponseProcessor {
    engine: Arc<PronunciationEngine>,
}

impl ResponseProcessor {
    pub fn new(engine: Arc<PronunciationEngine>) -> Self {
        Self { engine }
    }

    /// Parse `response` and complete it.  `requested` is used as the label
    /// when the response does not carry one.
    pub fn process(&self, response: &str, requested: Difficulty) -> Result<Processed, ParseError> {
        let candidate = parse_response(response)?;
        Ok(self.complete(candidate, requested))
    }

    /// Fill in derived fields of an already-decoded candidate.
    pub fn complete(&self, candidate: Candidate, requested: Difficulty) -> Processed {
        let kind = candidate.kind.unwrap_or(requested);
        if kind != requested {
            log::debug!("response labelled '{kind}' although '{requested}' was requested");
        }

        let mut vi_spoken_word = candidate
            .vi_spoken_word
            .unwrap_or_else(|| vec![String::new(); candidate.en_word.len()]);

        let mut auto_fixed = Vec::new();
        let mut fallback_terms = Vec::new();
        for (en, vi) in candidate.en_word.iter().zip(vi_spoken_word.iter_mut()) {
            if !vi.trim().is_empty() && !vi.trim().eq_ignore_ascii_case(en.trim()) {
                continue;
            }
            match self.engine.transliterate(en) {
                Ok(t) => {
                    log::debug!("auto-fixed transliteration: '{en}' → '{}'", t.text());
                    fallback_terms.extend(t.fallback_terms().map(str::to_string));
                    *vi = t.text();
                    auto_fixed.push(en.clone());
                }
                Err(e) => log::debug!("cannot auto-fix '{en}': {e}"),
            }
        }

        let spoken = rebuild_spoken(&candidate.origin, &candidate.en_word, &vi_spoken_word);
        if let Some(given) = &candidate.spoken {
            if !text::same_tokens(given, &spoken) {
                log::debug!("replaced spoken '{given}' with '{spoken}'");
            }
        }

        let en_phrase = candidate
            .en_phrase
            .unwrap_or_else(|| extract_phrases(&candidate.origin, &candidate.en_word, kind));

        Processed {
            record: Record {
                origin: candidate.origin,
                spoken,
                en_word: candidate.en_word,
                vi_spoken_word,
                kind,
                en_phrase,
            },
            auto_fixed,
            fallback_terms,
        }
    }
}

/// Render `origin` with every English word replaced by its transliteration.
///
/// Longer words are replaced first so a word that contains another is not
/// split.  The result is lowercased.
///
/// ```rust
/// use meeting_codeswitch::dataset::repair::rebuild_spoken;
///
/// let en = vec!["Team".to_string(), "review".to_string()];
/// let vi = vec!["tím".to_string(), "ri viu".to_string()];
/// assert_eq!(rebuild_spoken("Team cần review lại", &en, &vi), "tím cần ri viu lại");
/// ```
pub fn rebuild_spoken(origin: &str, en_word: &[String], vi_spoken_word: &[String]) -> String {
    let mut pairs: Vec<(&str, &str)> = en_word
        .iter()
        .zip(vi_spoken_word)
        .map(|(en, vi)| (en.trim(), vi.trim()))
        .filter(|(en, vi)| !en.is_empty() && !vi.is_empty())
        .collect();
    pairs.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
    pairs.dedup_by(|a, b| a.0.eq_ignore_ascii_case(b.0));

    let mut spoken = origin.to_string();
    for (en, vi) in pairs {
        spoken = text::replace_word(&spoken, en, vi);
    }
    spoken.to_lowercase()
}

/// Group English words into phrases: each maximal run of `origin` tokens
/// that matches consecutive `en_word` entries becomes one phrase.  `easy`
/// records only get single-word phrases.
///
/// ```rust
/// use meeting_codeswitch::dataset::{repair::extract_phrases, Difficulty};
///
/// let en: Vec<String> = ["Sprint", "Planning", "Meeting", "deadline"]
///     .iter().map(|s| s.to_string()).collect();
/// let phrases = extract_phrases("Sprint Planning Meeting trước deadline", &en, Difficulty::Hard);
/// assert_eq!(phrases, vec!["Sprint Planning Meeting", "deadline"]);
/// ```
pub fn extract_phrases(origin: &str, en_word: &[String], kind: Difficulty) -> Vec<String> {
    if kind == Difficulty::Easy {
        return en_word.to_vec();
    }

    let mut phrases = Vec::new();
    let mut run: Vec<&str> = Vec::new();
    let mut next = 0;

    for token in text::tokens(origin) {
        let matches_next = en_word
            .get(next)
            .is_some_and(|w| w.trim().eq_ignore_ascii_case(token));
        if matches_next {
            run.push(token);
            next += 1;
        } else if !run.is_empty() {
            phrases.push(run.join(" "));
            run.clear();
        }
    }
    if !run.is_empty() {
        phrases.push(run.join(" "));
    }

    // Words the scan could not place still count as single-word phrases.
    phrases.extend(en_word[next.min(en_word.len())..].iter().cloned());
    phrases
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> ResponseProcessor {
        ResponseProcessor::new(Arc::new(PronunciationEngine::builtin()))
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn well_formed_full_response_is_kept() {
        let out = processor()
            .process(
                r#"{"origin": "Team cần review code", "spoken": "Tím cần ri viu cốt",
                    "en_word": ["Team", "review", "code"], "vi_spoken_word": ["tím", "ri viu", "cốt"],
                    "type": "easy", "en_phrase": ["Team", "review", "code"]}"#,
                Difficulty::Hard,
            )
            .unwrap();
        assert!(out.auto_fixed.is_empty());
        assert_eq!(out.record.spoken, "tím cần ri viu cốt");
        assert_eq!(out.record.kind, Difficulty::Easy);
    }

    #[test]
    fn untransliterated_word_is_fixed_and_spoken_rebuilt() {
        let out = processor()
            .process(
                r#"{"origin": "Team cần review code", "spoken": "tím cần review cốt",
                    "en_word": ["Team", "review", "code"], "vi_spoken_word": ["tím", "Review", "cốt"],
                    "type": "easy"}"#,
                Difficulty::Easy,
            )
            .unwrap();
        assert_eq!(out.auto_fixed, vec!["review"]);
        assert_eq!(out.record.vi_spoken_word[1], "ri viu");
        assert_eq!(out.record.spoken, "tím cần ri viu cốt");
        assert_eq!(out.record.en_phrase, strings(&["Team", "review", "code"]));
    }

    #[test]
    fn spoken_that_drifts_from_origin_is_rebuilt() {
        let out = processor()
            .process(
                r#"{"origin": "Team cần review code", "spoken": "tím đã ri viu xong cốt hôm qua",
                    "en_word": ["Team", "review", "code"], "vi_spoken_word": ["tím", "ri viu", "cốt"],
                    "type": "easy", "en_phrase": ["Team", "review", "code"]}"#,
                Difficulty::Easy,
            )
            .unwrap();
        assert!(out.auto_fixed.is_empty());
        assert_eq!(out.record.spoken, "tím cần ri viu cốt");
        assert!(crate::dataset::validate_record(&out.record).ok);
    }

    #[test]
    fn simple_shape_is_completed_from_the_engine() {
        let out = processor()
            .process(
                r#"{"text": "Sprint Planning Meeting bắt đầu lúc 9 giờ", "en_words": ["Sprint", "Planning", "Meeting"]}"#,
                Difficulty::Hard,
            )
            .unwrap();
        let r = out.record;
        assert_eq!(r.vi_spoken_word, strings(&["xờ pin", "pờ lán ninh", "mí tinh"]));
        assert_eq!(r.spoken, "xờ pin pờ lán ninh mí tinh bắt đầu lúc 9 giờ");
        assert_eq!(r.en_phrase, strings(&["Sprint Planning Meeting"]));
        assert_eq!(r.kind, Difficulty::Hard);
        assert_eq!(out.auto_fixed.len(), 3);
    }

    #[test]
    fn fallback_terms_are_reported() {
        let out = processor()
            .process(r#"{"text": "Cần refactor module", "en_words": ["refactor"]}"#, Difficulty::Easy)
            .unwrap();
        assert_eq!(out.fallback_terms, vec!["refactor"]);
        assert!(!out.record.vi_spoken_word[0].is_empty());
    }

    #[test]
    fn unknown_term_leaves_empty_transliteration() {
        let out = processor()
            .process(r#"{"text": "Đừng naïve quá", "en_words": ["naïve"]}"#, Difficulty::Easy)
            .unwrap();
        assert_eq!(out.record.vi_spoken_word, vec![String::new()]);
        assert!(out.auto_fixed.is_empty());
    }

    #[test]
    fn parse_errors_propagate() {
        assert_eq!(
            processor().process("không có JSON", Difficulty::Easy),
            Err(ParseError::NoJsonObject)
        );
    }

    #[test]
    fn rebuild_replaces_longest_first_and_whole_words_only() {
        let en = strings(&["test", "unit test", "testing"]);
        let vi = strings(&["tét", "diu nít tét", "tét tinh"]);
        assert_eq!(
            rebuild_spoken("Viết unit test trước khi testing, test lại", &en, &vi),
            "viết diu nít tét trước khi tét tinh, tét lại"
        );
    }

    #[test]
    fn phrases_break_on_vietnamese_words() {
        let en = strings(&["email", "update", "status", "client"]);
        assert_eq!(
            extract_phrases("Gửi email update status cho client", &en, Difficulty::Mixed),
            strings(&["email update status", "client"])
        );
    }

    #[test]
    fn easy_phrases_are_single_words() {
        let en = strings(&["fix", "bug"]);
        assert_eq!(extract_phrases("Em fix bug rồi", &en, Difficulty::Easy), en);
    }

    #[test]
    fn unplaced_words_become_single_phrases() {
        let en = strings(&["deadline", "sprint"]);
        assert_eq!(
            extract_phrases("Deadline-driven work", &en, Difficulty::Hard),
            strings(&["deadline", "sprint"])
        );
    }
}
