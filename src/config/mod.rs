//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), one sub-config per subsystem,
//! the scenario/difficulty weight tables, `AppPaths` for the default settings
//! location, and TOML persistence via `AppConfig::load_from` /
//! `AppConfig::save_to`.

pub mod paths;
pub mod scenario;
pub mod settings;

pub use paths::AppPaths;
pub use scenario::{check_weights, ScenarioConfig, WEIGHT_TOLERANCE};
pub use settings::{
    AppConfig, ConfigError, DatasetConfig, DeliveryPolicy, GenerationConfig, LlmConfig,
    LlmProvider, PromptConfig, PronunciationConfig,
};
