//! Scenario and difficulty weight tables.
//!
//! Both tables are categorical distributions: every weight must be finite
//! and non-negative and the weights must sum to 1.0 within
//! [`WEIGHT_TOLERANCE`].  Violations are reported as
//! [`ConfigError::Weights`] before any generation starts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::dataset::Difficulty;

/// Allowed absolute deviation of a weight table's sum from 1.0.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// Check that `weights` form a probability distribution.
///
/// `table` is only used in the error message.
pub fn check_weights<'a>(
    table: &str,
    weights: impl IntoIterator<Item = (&'a str, f64)>,
) -> Result<(), ConfigError> {
    let err = |reason: String| ConfigError::Weights {
        table: table.to_string(),
        reason,
    };

    let mut sum = 0.0;
    let mut count = 0usize;
    for (name, weight) in weights {
        if !weight.is_finite() || weight < 0.0 {
            return Err(err(format!("has invalid weight {weight} for '{name}'")));
        }
        sum += weight;
        count += 1;
    }

    if count == 0 {
        return Err(err("is empty".into()));
    }
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(err(format!("sums to {sum:.4}, expected 1.0")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ScenarioConfig
// ---------------------------------------------------------------------------

/// Sampling tables for meeting contexts, difficulty levels and business
/// domains (`[scenarios]` in `settings.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Business domains, drawn uniformly.
    pub domains: Vec<String>,
    /// Meeting context id → probability.
    pub meeting_contexts: BTreeMap<String, f64>,
    /// Difficulty label (`easy` / `hard` / `mixed`) → probability.
    pub difficulty_levels: BTreeMap<String, f64>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        let meeting_contexts = [
            ("daily_standup", 0.20),
            ("sprint_planning", 0.15),
            ("client_presentation", 0.15),
            ("technical_discussion", 0.20),
            ("performance_review", 0.10),
            ("training_session", 0.10),
            ("team_meeting", 0.10),
        ];
        let difficulty_levels = [("easy", 0.4), ("hard", 0.3), ("mixed", 0.3)];
        let domains = [
            "software_development",
            "marketing",
            "finance",
            "human_resources",
            "sales",
        ];

        Self {
            domains: domains.into_iter().map(String::from).collect(),
            meeting_contexts: meeting_contexts
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            difficulty_levels: difficulty_levels
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

impl ScenarioConfig {
    /// Validate both weight tables and the domain list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_weights(
            "meeting_contexts",
            self.meeting_contexts.iter().map(|(k, v)| (k.as_str(), *v)),
        )?;
        self.difficulty_weights()?;
        if self.domains.iter().any(|d| d.trim().is_empty()) {
            return Err(ConfigError::Invalid("scenarios.domains contains an empty entry".into()));
        }
        Ok(())
    }

    /// Difficulty table with parsed labels.
    pub fn difficulty_weights(&self) -> Result<Vec<(Difficulty, f64)>, ConfigError> {
        check_weights(
            "difficulty_levels",
            self.difficulty_levels.iter().map(|(k, v)| (k.as_str(), *v)),
        )?;
        self.difficulty_levels
            .iter()
            .map(|(label, weight)| -> Result<_, ConfigError> {
                Ok((label.parse::<Difficulty>()?, *weight))
            })
            .collect()
    }

    /// Context table as `(id, weight)` pairs in key order.
    pub fn context_weights(&self) -> Vec<(String, f64)> {
        self.meeting_contexts
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
