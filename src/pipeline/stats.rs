//! Run-scoped generation counters.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::llm::{ErrorKind, GenerationError};

/// Counters accumulated by the generation loop.
///
/// Mutated only by [`DatasetRunner`](super::DatasetRunner) while a run is in
/// progress; read-only once the run returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationStats {
    /// Samples started.
    pub samples: usize,
    /// Calls made to the generation service.
    pub attempts: usize,
    /// Samples that produced an accepted record.
    pub successes: usize,
    /// Samples dropped after exhausting their attempts.
    pub failures: usize,
    /// Failed attempts by cause.
    pub api_errors: usize,
    pub parse_errors: usize,
    pub validation_errors: usize,
    /// Transliterations replaced by the pronunciation engine.
    pub auto_fixed: usize,
    /// Terms the engine rendered through its syllable fallback.
    pub fallback_terms: BTreeSet<String>,
    /// `true` when the run was interrupted before finishing.
    pub cancelled: bool,
}

impl GenerationStats {
    /// Count one failed attempt under its error kind.
    pub fn record_error(&mut self, error: &GenerationError) {
        match error.kind() {
            ErrorKind::Api => self.api_errors += 1,
            ErrorKind::Parse => self.parse_errors += 1,
            ErrorKind::Validation => self.validation_errors += 1,
            ErrorKind::Cancelled => {}
        }
    }

    /// Accepted samples as a percentage of started samples.
    pub fn success_rate(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.successes as f64 * 100.0 / self.samples as f64
        }
    }
}

impl fmt::Display for GenerationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Samples:        {}", self.samples)?;
        writeln!(f, "Attempts:       {}", self.attempts)?;
        writeln!(
            f,
            "Successful:     {} ({:.1}%)",
            self.successes,
            self.success_rate()
        )?;
        writeln!(f, "Failed:         {}", self.failures)?;
        writeln!(
            f,
            "Errors:         api={} parse={} validation={}",
            self.api_errors, self.parse_errors, self.validation_errors
        )?;
        write!(f, "Auto-fixed:     {}", self.auto_fixed)?;
        if !self.fallback_terms.is_empty() {
            let terms: Vec<&str> = self.fallback_terms.iter().map(String::as_str).collect();
            write!(f, "\nNo rule for:    {}", terms.join(", "))?;
        }
        if self.cancelled {
            write!(f, "\nRun was interrupted; partial results kept.")?;
        }
        Ok(())
    }
}
