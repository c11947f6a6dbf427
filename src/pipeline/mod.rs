//! Generation loop for the code-switching dataset.
//!
//! This module wires scenario sampling, prompt building, the generation
//! service, response repair and validation into one sequential run.
//!
//! # Architecture
//!
//! ```text
//! DatasetRunner::generate_dataset(n)
//!        │
//!        ├─ ScenarioSampler::draw          context / domain / difficulty
//!        ├─ PromptBuilder::build_prompt    few-shot payload
//!        │
//!        └─ generate_one(prompt)           AttemptState per sample
//!              │
//!              ├─ TextGenerator::generate        paced by request_delay
//!              ├─ ResponseProcessor::process     parse + auto-fix
//!              └─ Validator::validate_record     accept or retry
//!
//! GenerationStats ◀── counters returned with the records
//! ```

pub mod runner;
pub mod state;
pub mod stats;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::DatasetRunner;
pub use state::{AttemptEvent, AttemptState, RetryPolicy};
pub use stats::GenerationStats;
