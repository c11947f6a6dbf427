//! Prompt builder for code-switching sentence generation.
//!
//! [`PromptBuilder::build_prompt`] turns a [`SampledScenario`] into a
//! [`PromptPayload`]: the fixed system instruction, a few-shot selection
//! from the loaded example records, and a user message naming the scenario,
//! domain and difficulty together with length and pronunciation hints.
//!
//! Building a prompt has no side effects; the output depends only on the
//! scenario and the immutable examples and rules held by the builder.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::{ConfigError, PromptConfig};
use crate::dataset::{Difficulty, Record};
use crate::pronunciation::PronunciationEngine;

use super::sampler::SampledScenario;
use super::scenario::{difficulty_hint, find_context};

// ---------------------------------------------------------------------------
// System instruction
// ---------------------------------------------------------------------------

/// Used when no `prompt.system_prompt_file` is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
Bạn là chuyên gia tạo dữ liệu code-switching Việt-Anh cho hệ thống nhận dạng giọng nói.
Nhiệm vụ: viết MỘT câu nói tự nhiên trong cuộc họp công việc, câu tiếng Việt có chen từ tiếng Anh.

Quy tắc:
1. origin: câu gốc, giữ nguyên từ tiếng Anh như người Việt hay nói trong họp.
2. spoken: câu origin viết lại toàn bộ bằng phiên âm tiếng Việt, chữ thường, không còn từ tiếng Anh nào.
3. en_word: từng từ tiếng Anh theo thứ tự xuất hiện trong origin.
4. vi_spoken_word: phiên âm của từng phần tử en_word, cùng số lượng và cùng thứ tự.
5. en_phrase: các từ hoặc cụm từ tiếng Anh liền nhau (ví dụ \"Sprint Planning Meeting\").
6. type: easy (chỉ từ đơn), hard (thuật ngữ, có cụm nhiều từ) hoặc mixed.
7. Chỉ trả về một JSON object, không giải thích.";

/// Built-in few-shot records.
const BUILTIN_EXAMPLES_JSON: &str = include_str!("../../data/few_shot_examples.json");

/// Examples of the requested difficulty preferred in each prompt.
const SAME_DIFFICULTY_EXAMPLES: usize = 2;

/// Target length per difficulty, in words of `origin`.
fn length_hint(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "Độ dài: 8-15 từ, 1-2 từ tiếng Anh",
        Difficulty::Hard => "Độ dài: 12-25 từ, ít nhất 3 từ tiếng Anh, có cụm nhiều từ",
        Difficulty::Mixed => "Độ dài: 10-20 từ, 2-4 từ tiếng Anh",
    }
}

// ---------------------------------------------------------------------------
// Few-shot examples
// ---------------------------------------------------------------------------

/// Parse a few-shot file body: a JSON array of records.
pub fn parse_examples(json: &str) -> Result<Vec<Record>, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Examples(e.to_string()))
}

/// Load few-shot records from a JSON file.
pub fn load_examples(path: &Path) -> Result<Vec<Record>, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_examples(&data)
        .map_err(|e| ConfigError::Examples(format!("{}: {e}", path.display())))
}

/// The built-in few-shot records.
pub fn builtin_examples() -> Vec<Record> {
    parse_examples(BUILTIN_EXAMPLES_JSON).unwrap_or_else(|e| {
        log::error!("built-in few-shot examples are malformed: {e}");
        Vec::new()
    })
}

// ---------------------------------------------------------------------------
// PromptPayload
// ---------------------------------------------------------------------------

/// Everything the generation service needs for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPayload {
    /// System instruction.
    pub system: String,
    /// The few-shot records embedded in `user`.
    pub examples: Vec<Record>,
    /// Meeting context id.
    pub scenario: String,
    pub domain: String,
    pub difficulty: Difficulty,
    /// Rendered user message.
    pub user: String,
}

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds generation prompts from sampled scenarios.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use meeting_codeswitch::dataset::Difficulty;
/// use meeting_codeswitch::llm::{PromptBuilder, SampledScenario};
/// use meeting_codeswitch::pronunciation::PronunciationEngine;
///
/// let builder = PromptBuilder::new(Arc::new(PronunciationEngine::builtin()));
/// let payload = builder.build_prompt(&SampledScenario {
///     context: "sprint_planning".into(),
///     domain: "software_development".into(),
///     difficulty: Difficulty::Hard,
/// });
/// assert!(payload.user.contains("Sprint Planning Meeting"));
/// assert_eq!(payload.examples.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system_prompt: String,
    examples: Vec<Record>,
    num_examples: usize,
    engine: Arc<PronunciationEngine>,
}

impl PromptBuilder {
    /// Builder with the default system prompt, the built-in examples and
    /// three examples per prompt.
    pub fn new(engine: Arc<PronunciationEngine>) -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            examples: builtin_examples(),
            num_examples: 3,
            engine,
        }
    }

    /// Builder from the `[prompt]` config section.  Configured files that
    /// cannot be read or parsed are a [`ConfigError`].
    pub fn from_config(
        config: &PromptConfig,
        engine: Arc<PronunciationEngine>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Self::new(engine).with_num_examples(config.num_examples);

        if let Some(path) = &config.few_shot_file {
            let examples = load_examples(path)?;
            log::info!("loaded {} few-shot examples from {}", examples.len(), path.display());
            builder = builder.with_examples(examples);
        }
        if let Some(path) = &config.system_prompt_file {
            let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            builder = builder.with_system_prompt(text.trim());
        }

        Ok(builder)
    }

    pub fn with_examples(mut self, examples: Vec<Record>) -> Self {
        self.examples = examples;
        self
    }

    pub fn with_num_examples(mut self, num_examples: usize) -> Self {
        self.num_examples = num_examples;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: &str) -> Self {
        self.system_prompt = system_prompt.to_string();
        self
    }

    pub fn examples(&self) -> &[Record] {
        &self.examples
    }

    /// Few-shot selection: up to two examples of `difficulty`, then others,
    /// both in file order, capped at `num_examples`.
    pub fn select_examples(&self, difficulty: Difficulty) -> Vec<&Record> {
        let same = self
            .examples
            .iter()
            .filter(|e| e.kind == difficulty)
            .take(SAME_DIFFICULTY_EXAMPLES.min(self.num_examples));
        let others = self.examples.iter().filter(|e| e.kind != difficulty);

        same.chain(others).take(self.num_examples).collect()
    }

    /// Assemble the request for one sample.
    pub fn build_prompt(&self, scenario: &SampledScenario) -> PromptPayload {
        let context = find_context(&scenario.context);
        let examples: Vec<Record> = self
            .select_examples(scenario.difficulty)
            .into_iter()
            .cloned()
            .collect();

        let mut user = String::with_capacity(2048);
        if !examples.is_empty() {
            user.push_str("Dưới đây là các ví dụ mẫu về code-switching trong meeting:\n\n");
            for (i, example) in examples.iter().enumerate() {
                user.push_str(&format!("[Ví dụ {}]\n", i + 1));
                // Records always serialise; an empty string only drops the example body.
                user.push_str(&serde_json::to_string_pretty(example).unwrap_or_default());
                user.push_str("\n\n");
            }
            user.push_str("---\n\n");
        }

        user.push_str("Bây giờ hãy tạo 1 câu mới cho:\n");
        user.push_str(&format!("- Bối cảnh: {} ({})\n", context.name, context.situation));
        user.push_str(&format!("- Lĩnh vực: {}\n", scenario.domain));
        user.push_str(&format!("- Độ khó: {}\n\n", scenario.difficulty));

        if !context.common_phrases.is_empty() {
            user.push_str(&format!(
                "Cụm từ thường gặp: {}\n",
                context.common_phrases.join(", ")
            ));
        }
        user.push_str(&format!("Từ khóa gợi ý: {}\n", context.keywords.join(", ")));

        let hints = self.pronunciation_hints(context.keywords);
        if !hints.is_empty() {
            user.push_str("Phiên âm chuẩn:\n");
            for hint in hints {
                user.push_str(&format!("- {hint}\n"));
            }
        }

        user.push_str(difficulty_hint(scenario.difficulty));
        user.push('\n');
        user.push_str(length_hint(scenario.difficulty));
        user.push_str("\n\nCHỈ trả về JSON, theo format như ví dụ trên.");

        PromptPayload {
            system: self.system_prompt.clone(),
            examples,
            scenario: scenario.context.clone(),
            domain: scenario.domain.clone(),
            difficulty: scenario.difficulty,
            user,
        }
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// `keyword → rendering` lines for keywords the engine can handle.
    fn pronunciation_hints(&self, keywords: &[&str]) -> Vec<String> {
        keywords
            .iter()
            .filter_map(|kw| match self.engine.transliterate(kw) {
                Ok(t) => Some(format!("{kw} → {}", t.text())),
                Err(e) => {
                    log::debug!("no pronunciation hint: {e}");
                    None
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
