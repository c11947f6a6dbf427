//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.  Every section is
//! `#[serde(default)]`, so a settings file only needs the keys it changes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{AppPaths, ScenarioConfig};
use crate::dataset::UnknownDifficulty;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Fatal configuration problems.  Any of these aborts the run before the
/// first generation request.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configured file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `settings.toml` is not valid TOML or has wrongly typed keys.
    #[error("invalid settings file: {0}")]
    Toml(#[from] toml::de::Error),

    /// A weight table is empty, has a bad weight, or does not sum to 1.0.
    #[error("weight table '{table}' {reason}")]
    Weights { table: String, reason: String },

    /// A difficulty table key is not `easy`, `hard` or `mixed`.
    #[error(transparent)]
    Difficulty(#[from] UnknownDifficulty),

    /// The pronunciation rules file is not a JSON object.
    #[error("invalid pronunciation rules: {0}")]
    Rules(String),

    /// The few-shot examples file is not a JSON array of records.
    #[error("invalid few-shot examples: {0}")]
    Examples(String),

    /// Any other out-of-range setting.
    #[error("invalid setting: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// LlmProvider
// ---------------------------------------------------------------------------

/// Wire protocol spoken by the text-generation service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// Any OpenAI-compatible `/v1/chat/completions` endpoint (OpenAI, Groq,
    /// Ollama in OpenAI mode, LM Studio, vLLM …).
    OpenAiCompatible,
    /// Google Gemini `generateContent`.
    Gemini,
}

impl Default for LlmProvider {
    fn default() -> Self {
        Self::OpenAiCompatible
    }
}

impl LlmProvider {
    /// Environment variable consulted when `api_key` is not set.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            LlmProvider::OpenAiCompatible => "OPENAI_API_KEY",
            LlmProvider::Gemini => "GEMINI_API_KEY",
        }
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Connection and sampling parameters for the generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which protocol to speak.
    pub provider: LlmProvider,
    /// Base URL of the API endpoint.
    ///
    /// - OpenAI: `https://api.openai.com`
    /// - Gemini: `https://generativelanguage.googleapis.com`
    pub base_url: String,
    /// API key.  `None` falls back to the provider's environment variable.
    pub api_key: Option<String>,
    /// Model identifier (e.g. `"gpt-4o-mini"`, `"gemini-1.5-flash"`).
    pub model: String,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f32,
    /// Upper bound on generated tokens per request.
    pub max_tokens: u32,
    /// Maximum seconds to wait for one response before timing out.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            base_url: "https://api.openai.com".into(),
            api_key: None,
            model: "gpt-4o-mini".into(),
            temperature: 0.7,
            max_tokens: 300,
            timeout_secs: 30,
        }
    }
}

impl LlmConfig {
    /// The configured key, or the provider's environment variable.  Empty
    /// strings count as absent.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(self.provider.api_key_env()).ok())
            .filter(|k| !k.is_empty())
    }
}

// ---------------------------------------------------------------------------
// GenerationConfig
// ---------------------------------------------------------------------------

/// What to do when some samples exhaust their retries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Run exactly the requested number of samples; failed samples are
    /// simply missing from the output.
    BestEffort,
    /// Keep drawing samples until the requested number of records has been
    /// accepted, bounded by `max_failed_samples`.
    Backfill,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self::BestEffort
    }
}

/// Retry, pacing and delivery settings of the generation loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Extra attempts per sample after the first one fails.
    pub max_retries: u32,
    /// Pause between attempts of the same sample, in milliseconds.
    pub retry_delay_ms: u64,
    /// Pause between any two consecutive service calls, in milliseconds.
    pub request_delay_ms: u64,
    /// Under-delivery policy.
    pub delivery: DeliveryPolicy,
    /// Failed-sample cap for [`DeliveryPolicy::Backfill`].  `None` means
    /// twice the requested size.
    pub max_failed_samples: Option<usize>,
    /// Seed for scenario sampling; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1_000,
            request_delay_ms: 500,
            delivery: DeliveryPolicy::default(),
            max_failed_samples: None,
            seed: None,
        }
    }
}

impl GenerationConfig {
    /// Total attempts allowed per sample (first try + retries).
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// DatasetConfig / PromptConfig / PronunciationConfig
// ---------------------------------------------------------------------------

/// Output dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Number of samples to request.
    pub size: usize,
    /// Where the JSON array is written.
    pub output_file: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            size: 100,
            output_file: PathBuf::from("output/meeting_dataset.json"),
        }
    }
}

/// Prompt assembly settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Few-shot examples included per request.
    pub num_examples: usize,
    /// JSON array of example records; `None` uses the built-in examples.
    pub few_shot_file: Option<PathBuf>,
    /// Plain-text system instructions; `None` uses the built-in text.
    pub system_prompt_file: Option<PathBuf>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            num_examples: 3,
            few_shot_file: None,
            system_prompt_file: None,
        }
    }
}

/// Pronunciation rule source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PronunciationConfig {
    /// JSON rules file; `None` uses the built-in rules.
    pub rules_file: Option<PathBuf>,
    /// Reject records whose transliteration of a known term differs from
    /// every rule candidate.
    pub strict: bool,
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use meeting_codeswitch::config::AppConfig;
///
/// // Returns defaults when the file is missing, then validates.
/// let config = AppConfig::load().unwrap();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub generation: GenerationConfig,
    pub dataset: DatasetConfig,
    pub prompt: PromptConfig,
    pub pronunciation: PronunciationConfig,
    pub scenarios: ScenarioConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check every invariant that must hold before generation starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scenarios.validate()?;

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::Invalid("llm.max_tokens must be positive".into()));
        }
        if self.generation.max_failed_samples == Some(0) {
            return Err(ConfigError::Invalid(
                "generation.max_failed_samples must be positive".into(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.model must not be empty".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
