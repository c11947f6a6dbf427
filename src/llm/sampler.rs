//! Categorical sampling of scenario parameters.
//!
//! Every sample is drawn independently from the validated weight tables.
//! The random source is passed in by the caller so tests can use a seeded
//! `StdRng`.

use std::fmt;

use rand::Rng;

use crate::config::{check_weights, ConfigError, ScenarioConfig};
use crate::dataset::Difficulty;

/// Domain used when `scenarios.domains` is empty.
const DEFAULT_DOMAIN: &str = "general";

// ---------------------------------------------------------------------------
// CategoricalSampler
// ---------------------------------------------------------------------------

/// Discrete distribution over `T` built from a validated weight table.
#[derive(Debug, Clone)]
pub struct CategoricalSampler<T> {
    items: Vec<T>,
    cumulative: Vec<f64>,
}

impl<T: fmt::Display> CategoricalSampler<T> {
    /// Build a sampler, rejecting tables that are not a distribution.
    pub fn new(table: &str, weighted: Vec<(T, f64)>) -> Result<Self, ConfigError> {
        let names: Vec<String> = weighted.iter().map(|(item, _)| item.to_string()).collect();
        check_weights(
            table,
            names.iter().map(String::as_str).zip(weighted.iter().map(|(_, w)| *w)),
        )?;

        let mut items = Vec::with_capacity(weighted.len());
        let mut cumulative = Vec::with_capacity(weighted.len());
        let mut running = 0.0;
        for (item, weight) in weighted {
            running += weight;
            items.push(item);
            cumulative.push(running);
        }

        Ok(Self { items, cumulative })
    }
}

impl<T> CategoricalSampler<T> {
    /// Draw one item.  Zero-weight items are never returned.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &T {
        // The table sums to 1.0 within tolerance; scaling by the real total
        // keeps the last bucket reachable.
        let total = self.cumulative.last().copied().unwrap_or(1.0);
        let x = rng.random::<f64>() * total;
        let idx = self
            .cumulative
            .partition_point(|&c| c <= x)
            .min(self.items.len() - 1);
        &self.items[idx]
    }
}

// ---------------------------------------------------------------------------
// ScenarioSampler
// ---------------------------------------------------------------------------

/// The parameters drawn for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledScenario {
    /// Meeting context id (e.g. `"sprint_planning"`).
    pub context: String,
    /// Business domain (e.g. `"software_development"`).
    pub domain: String,
    pub difficulty: Difficulty,
}

/// Draws [`SampledScenario`]s from a [`ScenarioConfig`].
#[derive(Debug, Clone)]
pub struct ScenarioSampler {
    contexts: CategoricalSampler<String>,
    difficulties: CategoricalSampler<Difficulty>,
    domains: Vec<String>,
}

impl ScenarioSampler {
    /// Build from config; fails with [`ConfigError`] on invalid tables.
    pub fn from_config(config: &ScenarioConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            contexts: CategoricalSampler::new("meeting_contexts", config.context_weights())?,
            difficulties: CategoricalSampler::new(
                "difficulty_levels",
                config.difficulty_weights()?,
            )?,
            domains: config.domains.clone(),
        })
    }

    /// Draw context, domain and difficulty independently.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> SampledScenario {
        let domain = if self.domains.is_empty() {
            DEFAULT_DOMAIN.to_string()
        } else {
            self.domains[rng.random_range(0..self.domains.len())].clone()
        };

        SampledScenario {
            context: self.contexts.sample(rng).clone(),
            domain,
            difficulty: *self.difficulties.sample(rng),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
