//! Dataset records and everything that checks or persists them.
//!
//! * [`record`] — the [`Record`] schema and [`Difficulty`] labels.
//! * [`parse`] — decoding free-text responses ([`ParseError`]).
//! * [`repair`] — completing decoded responses with the pronunciation engine.
//! * [`validator`] — record invariants and [`DatasetStats`].
//! * [`output`] — the JSON dataset file.

pub mod output;
pub mod parse;
pub mod record;
pub mod repair;
pub mod text;
pub mod validator;

pub use output::{load_dataset, save_dataset, OutputError};
pub use parse::{parse_response, Candidate, ParseError, ResponseShape};
pub use record::{Difficulty, Record, UnknownDifficulty};
pub use repair::{Processed, ResponseProcessor};
pub use validator::{
    validate_dataset, validate_record, DatasetStats, RecordErrors, ValidationResult, Validator,
    Violation,
};
