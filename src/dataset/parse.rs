//! Decoding of free-text generation responses.
//!
//! All tolerance for sloppy output lives here: markdown fences, commentary
//! before or after the object, and the two response shapes the generator
//! may use.  Everything downstream works on a typed [`Candidate`].
//!
//! Accepted shapes:
//!
//! ```text
//! full:   {"origin", "spoken"?, "en_word", "vi_spoken_word", "type", "en_phrase"?}
//! simple: {"text", "en_words", "difficulty"?, "context"?}
//! ```

use serde_json::{Map, Value};
use thiserror::Error;

use super::record::Difficulty;

// ---------------------------------------------------------------------------
// ParseError
// ---------------------------------------------------------------------------

/// A response that cannot be decomposed into record fields.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("response contains no JSON object")]
    NoJsonObject,

    #[error("response JSON is invalid: {0}")]
    InvalidJson(String),

    #[error("response is missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// Which of the two accepted response shapes was decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Full,
    Simple,
}

/// Field values decoded from a response, before repair.
///
/// Optional fields are the ones the processor can derive itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub shape: ResponseShape,
    pub origin: String,
    pub spoken: Option<String>,
    pub en_word: Vec<String>,
    pub vi_spoken_word: Option<Vec<String>>,
    pub kind: Option<Difficulty>,
    pub en_phrase: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Contents of the first fenced code block, or the whole text.
fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after_open = &text[open + 3..];
    // Skip the info string (`json`, `JSON`, …) up to the end of the line.
    let body_start = after_open.find('\n').map_or(0, |i| i + 1);
    let body = &after_open[body_start..];
    match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    }
}

/// Balanced `{ … }` slice starting at byte `start`, honouring JSON strings.
fn balanced_object(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Find and decode the first JSON object embedded in `text`.
///
/// Every `{` is tried as a start position so stray braces in leading
/// commentary do not hide the real object.
pub fn extract_json_object(text: &str) -> Result<Map<String, Value>, ParseError> {
    let body = strip_code_fence(text);
    let mut last_error = None;

    for (start, _) in body.match_indices('{') {
        let Some(slice) = balanced_object(body, start) else {
            continue;
        };
        match serde_json::from_str::<Value>(slice) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(_) => {}
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    Err(match last_error {
        Some(e) => ParseError::InvalidJson(e),
        None => ParseError::NoJsonObject,
    })
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn string_field(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ParseError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(other) => Err(ParseError::InvalidField {
            field,
            reason: format!("expected a string, got {other}"),
        }),
    }
}

fn string_list(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<Vec<String>>, ParseError> {
    let items = match map.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(ParseError::InvalidField {
                field,
                reason: format!("expected a list of strings, got {other}"),
            })
        }
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.trim().to_string()),
            other => Err(ParseError::InvalidField {
                field,
                reason: format!("list element {other} is not a string"),
            }),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn difficulty_field(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<Difficulty>, ParseError> {
    string_field(map, field)?
        .map(|label| {
            label.parse::<Difficulty>().map_err(|e| ParseError::InvalidField {
                field,
                reason: e.to_string(),
            })
        })
        .transpose()
}

// ---------------------------------------------------------------------------
// parse_response
// ---------------------------------------------------------------------------

/// Decode a raw generation response into a [`Candidate`].
///
/// ```rust
/// use meeting_codeswitch::dataset::parse::{parse_response, ResponseShape};
///
/// let text = "Đây là kết quả:\n```json\n{\"text\": \"Fix bug nhé\", \"en_words\": [\"Fix\", \"bug\"]}\n```";
/// let candidate = parse_response(text).unwrap();
/// assert_eq!(candidate.shape, ResponseShape::Simple);
/// assert_eq!(candidate.en_word, vec!["Fix", "bug"]);
/// ```
pub fn parse_response(text: &str) -> Result<Candidate, ParseError> {
    let map = extract_json_object(text)?;

    if map.contains_key("origin") {
        parse_full(&map)
    } else if map.contains_key("text") {
        parse_simple(&map)
    } else {
        Err(ParseError::MissingFields(vec!["origin", "en_word", "vi_spoken_word", "type"]))
    }
}

fn parse_full(map: &Map<String, Value>) -> Result<Candidate, ParseError> {
    let origin = string_field(map, "origin")?;
    let en_word = string_list(map, "en_word")?;
    let vi_spoken_word = string_list(map, "vi_spoken_word")?;
    let kind = difficulty_field(map, "type")?;

    let mut missing = Vec::new();
    if origin.as_deref().map_or(true, str::is_empty) {
        missing.push("origin");
    }
    if en_word.is_none() {
        missing.push("en_word");
    }
    if vi_spoken_word.is_none() {
        missing.push("vi_spoken_word");
    }
    if kind.is_none() {
        missing.push("type");
    }

    match (origin, en_word, kind) {
        (Some(origin), Some(en_word), Some(kind)) if missing.is_empty() => Ok(Candidate {
            shape: ResponseShape::Full,
            origin,
            spoken: string_field(map, "spoken")?.filter(|s| !s.is_empty()),
            en_word,
            vi_spoken_word,
            kind: Some(kind),
            en_phrase: string_list(map, "en_phrase")?.filter(|p| !p.is_empty()),
        }),
        _ => Err(ParseError::MissingFields(missing)),
    }
}

fn parse_simple(map: &Map<String, Value>) -> Result<Candidate, ParseError> {
    let text = string_field(map, "text")?.filter(|t| !t.is_empty());
    let en_words = string_list(map, "en_words")?;

    match (text, en_words) {
        (Some(origin), Some(en_word)) => Ok(Candidate {
            shape: ResponseShape::Simple,
            origin,
            spoken: None,
            en_word,
            vi_spoken_word: None,
            kind: difficulty_field(map, "difficulty")?,
            en_phrase: None,
        }),
        (text, _) => {
            let mut missing = Vec::new();
            if text.is_none() {
                missing.push("text");
            }
            missing.push("en_words");
            Err(ParseError::MissingFields(missing))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
