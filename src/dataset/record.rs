//! Dataset record types.
//!
//! [`Record`] is one entry of the generated dataset.  Field names on the wire
//! are fixed (`origin`, `spoken`, `en_word`, `vi_spoken_word`, `type`,
//! `en_phrase`) so the output can be consumed by existing ASR tooling.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// Difficulty label of a record.
///
/// | Variant | English content                                  |
/// |---------|--------------------------------------------------|
/// | Easy    | isolated single words                            |
/// | Hard    | technical phrases, consecutive English runs      |
/// | Mixed   | a blend of single words and phrases              |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Hard,
    Mixed,
}

impl Difficulty {
    /// All labels, in canonical order.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Hard, Difficulty::Mixed];

    /// The wire label (`"easy"`, `"hard"`, `"mixed"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Hard => "hard",
            Difficulty::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the three difficulty labels.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown difficulty label '{0}' (expected easy, hard or mixed)")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "hard" => Ok(Difficulty::Hard),
            "mixed" => Ok(Difficulty::Mixed),
            _ => Err(UnknownDifficulty(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One code-switching sentence with its phonetic rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Vietnamese sentence with embedded English terms.
    pub origin: String,
    /// `origin` with every English span replaced by its transliteration.
    pub spoken: String,
    /// English tokens in order of appearance (duplicates allowed).
    pub en_word: Vec<String>,
    /// One transliteration per `en_word` element, same order.
    pub vi_spoken_word: Vec<String>,
    /// Difficulty label.
    #[serde(rename = "type")]
    pub kind: Difficulty,
    /// English semantic units: single words and multi-word runs.
    pub en_phrase: Vec<String>,
}

impl Record {
    /// Number of whitespace-separated tokens in a phrase.
    pub fn phrase_len(phrase: &str) -> usize {
        phrase.split_whitespace().count()
    }

    /// `true` when at least one `en_phrase` element spans several words.
    pub fn has_multi_word_phrase(&self) -> bool {
        self.en_phrase.iter().any(|p| Self::phrase_len(p) > 1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!(" hard ".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!("MIXED".parse::<Difficulty>().unwrap(), Difficulty::Mixed);
        assert!("medium".parse::<Difficulty>().is_err());
    }

    #[test]
    fn record_uses_type_key_on_the_wire() {
        let record = Record {
            origin: "Team cần review code".into(),
            spoken: "tím cần ri viu cốt".into(),
            en_word: vec!["Team".into(), "review".into(), "code".into()],
            vi_spoken_word: vec!["tím".into(), "ri viu".into(), "cốt".into()],
            kind: Difficulty::Easy,
            en_phrase: vec!["Team".into(), "review".into(), "code".into()],
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "easy");
        assert!(json.get("kind").is_none());

        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn multi_word_phrase_detection() {
        let mut record = Record {
            origin: "Sprint Planning Meeting".into(),
            spoken: String::new(),
            en_word: vec![],
            vi_spoken_word: vec![],
            kind: Difficulty::Hard,
            en_phrase: vec!["Sprint".into()],
        };
        assert!(!record.has_multi_word_phrase());

        record.en_phrase.push("Sprint Planning Meeting".into());
        assert!(record.has_multi_word_phrase());
    }
}
