//! Pronunciation module — English terms to Vietnamese phonetic spelling.
//!
//! * [`PronunciationRules`] — immutable term → rendering table (JSON file or
//!   the built-in set).
//! * [`PronunciationEngine`] — greedy longest-match lookup with an
//!   algorithmic fallback ([`approximate`]).
//!
//! The engine is built once at startup and shared read-only by the prompt
//! builder (pronunciation hints) and the response processor (auto-fix and
//! cross-checks).

pub mod engine;
pub mod fallback;
pub mod rules;

pub use engine::{MatchSource, PronunciationEngine, PronunciationError, Segment, Transliteration};
pub use fallback::approximate;
pub use rules::{normalize_term, PronunciationRules};
