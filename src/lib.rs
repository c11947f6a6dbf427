//! Synthetic Vietnamese–English code-switching meeting dataset generator.
//!
//! * [`config`] — TOML settings and scenario weight tables.
//! * [`pronunciation`] — English term → Vietnamese phonetic spelling.
//! * [`llm`] — prompt building, scenario sampling and the generation client.
//! * [`dataset`] — records, response parsing/repair, validation, output.
//! * [`pipeline`] — the retrying generation loop.

pub mod config;
pub mod dataset;
pub mod llm;
pub mod pipeline;
pub mod pronunciation;
