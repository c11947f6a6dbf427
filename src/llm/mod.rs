//! Everything on the generation-service side of the pipeline.
//!
//! This module provides:
//! * [`TextGenerator`] — async trait implemented by all generation backends.
//! * [`ApiGenerator`] — OpenAI-compatible / Gemini REST backend.
//! * [`PromptBuilder`] — builds few-shot prompts for a sampled scenario.
//! * [`ScenarioSampler`] — draws context, domain and difficulty from the
//!   configured weight tables.
//! * [`scenario`] — built-in meeting context catalogue.
//! * [`GenerationError`] — per-sample error variants.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use meeting_codeswitch::config::AppConfig;
//! use meeting_codeswitch::llm::{
//!     ApiGenerator, GenerationRequest, PromptBuilder, ScenarioSampler, TextGenerator,
//! };
//! use meeting_codeswitch::pronunciation::PronunciationEngine;
//! use rand::SeedableRng;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let engine = Arc::new(PronunciationEngine::builtin());
//!
//!     let sampler = ScenarioSampler::from_config(&config.scenarios).unwrap();
//!     let prompts = PromptBuilder::new(engine);
//!     let generator = ApiGenerator::from_config(&config.llm);
//!
//!     let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//!     let payload = prompts.build_prompt(&sampler.draw(&mut rng));
//!     let request = GenerationRequest::new(payload, &config.llm);
//!     println!("{}", generator.generate(&request).await.unwrap());
//! }
//! ```

pub mod client;
pub mod prompt;
pub mod sampler;
pub mod scenario;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{ApiGenerator, ErrorKind, GenerationError, GenerationRequest, TextGenerator};
pub use prompt::{PromptBuilder, PromptPayload, DEFAULT_SYSTEM_PROMPT};
pub use sampler::{CategoricalSampler, SampledScenario, ScenarioSampler};
pub use scenario::{find_context, MeetingContext};
