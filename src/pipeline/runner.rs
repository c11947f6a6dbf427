//! Dataset runner — drives the sample → prompt → generate → parse →
//! validate loop.
//!
//! # Per-sample flow
//!
//! ```text
//! ScenarioSampler::draw ──▶ PromptBuilder::build_prompt
//!   └─▶ generate_one(prompt)
//!         loop over AttemptState:
//!           pace ──▶ TextGenerator::generate ──▶ ResponseProcessor::process
//!                ──▶ Validator::validate_record
//!           ├─ ok     → Success           → record appended
//!           ├─ error  → RetryableFailure  → wait retry_delay, try again
//!           └─ error  → ExhaustedFailure  → sample dropped, failure counted
//! ```
//!
//! Calls are strictly sequential.  Consecutive calls are at least
//! `request_delay` apart whatever their outcome.  A cancellation signal stops
//! the run at the next await point; records accepted so far are returned and
//! a half-processed sample is never added.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::{AppConfig, ConfigError, DeliveryPolicy, LlmConfig};
use crate::dataset::{Record, ResponseProcessor, Validator};
use crate::llm::{
    GenerationError, GenerationRequest, PromptBuilder, PromptPayload, ScenarioSampler,
    TextGenerator,
};
use crate::pronunciation::PronunciationEngine;

use super::state::{AttemptEvent, AttemptState, RetryPolicy};
use super::stats::GenerationStats;

/// Resolve once `cancel` carries `true`.  Never resolves when the sender is
/// gone without having cancelled.
async fn wait_cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

// ---------------------------------------------------------------------------
// DatasetRunner
// ---------------------------------------------------------------------------

/// Runs the generation loop against any [`TextGenerator`].
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use meeting_codeswitch::config::AppConfig;
/// use meeting_codeswitch::llm::ApiGenerator;
/// use meeting_codeswitch::pipeline::DatasetRunner;
/// use meeting_codeswitch::pronunciation::PronunciationEngine;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AppConfig::load()?;
/// let engine = Arc::new(PronunciationEngine::builtin());
/// let generator = Arc::new(ApiGenerator::from_config(&config.llm));
///
/// let mut runner = DatasetRunner::new(generator, engine, &config)?;
/// let (records, stats) = runner.generate_dataset(config.dataset.size).await;
/// println!("{} records\n{stats}", records.len());
/// # Ok(())
/// # }
/// ```
pub struct DatasetRunner {
    generator: Arc<dyn TextGenerator>,
    prompts: PromptBuilder,
    sampler: ScenarioSampler,
    processor: ResponseProcessor,
    validator: Validator,
    llm: LlmConfig,
    policy: RetryPolicy,
    request_delay: Duration,
    delivery: DeliveryPolicy,
    max_failed_samples: Option<usize>,
    rng: StdRng,
    cancel: watch::Receiver<bool>,
    last_call: Option<Instant>,
    stats: GenerationStats,
}

impl DatasetRunner {
    /// Build a runner.  The whole config is validated first, so an invalid
    /// weight table or unreadable prompt file fails here, before any call
    /// reaches `generator`.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        engine: Arc<PronunciationEngine>,
        config: &AppConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let sampler = ScenarioSampler::from_config(&config.scenarios)?;
        let prompts = PromptBuilder::from_config(&config.prompt, Arc::clone(&engine))?;
        let validator = Validator::from_config(&config.pronunciation, Arc::clone(&engine));
        let rng = match config.generation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        // A receiver whose sender is already gone never reports cancellation.
        let (_, cancel) = watch::channel(false);

        Ok(Self {
            generator,
            prompts,
            sampler,
            processor: ResponseProcessor::new(engine),
            validator,
            llm: config.llm.clone(),
            policy: RetryPolicy::from_config(&config.generation),
            request_delay: config.generation.request_delay(),
            delivery: config.generation.delivery,
            max_failed_samples: config.generation.max_failed_samples,
            rng,
            cancel,
            last_call: None,
            stats: GenerationStats::default(),
        })
    }

    /// Stop the run when `cancel` becomes `true`.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Counters of the run in progress.
    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    // -----------------------------------------------------------------------
    // Dataset loop
    // -----------------------------------------------------------------------

    /// Generate up to `n` records.
    ///
    /// With [`DeliveryPolicy::BestEffort`] exactly `n` samples are run and
    /// failed ones are simply missing.  With [`DeliveryPolicy::Backfill`]
    /// samples are drawn until `n` records are accepted or
    /// `max_failed_samples` (default `2 * n`) samples have failed.
    /// Per-sample errors never abort the run.
    pub async fn generate_dataset(&mut self, n: usize) -> (Vec<Record>, GenerationStats) {
        self.stats = GenerationStats::default();
        let max_failed = self.max_failed_samples.unwrap_or(n.saturating_mul(2));
        let mut records = Vec::with_capacity(n);

        log::info!("generating {n} samples ({:?} delivery)", self.delivery);

        while !self.finished(n, records.len(), max_failed) {
            if self.is_cancelled() {
                self.stats.cancelled = true;
                break;
            }

            let scenario = self.sampler.draw(&mut self.rng);
            let prompt = self.prompts.build_prompt(&scenario);
            self.stats.samples += 1;
            let sample = self.stats.samples;
            log::debug!(
                "sample {sample}: context={} domain={} difficulty={}",
                scenario.context,
                scenario.domain,
                scenario.difficulty
            );

            match self.generate_one(&prompt).await {
                Ok(record) => {
                    self.stats.successes += 1;
                    records.push(record);
                    log::info!("sample {sample}: accepted ({}/{n})", records.len());
                }
                Err(GenerationError::Cancelled) => {
                    self.stats.cancelled = true;
                    break;
                }
                Err(err) => {
                    self.stats.failures += 1;
                    log::warn!("sample {sample}: dropped: {err}");
                }
            }
        }

        if self.stats.cancelled {
            log::warn!("run interrupted with {} records accepted", records.len());
        } else if records.len() < n {
            log::warn!(
                "delivered {}/{n} records ({} samples failed)",
                records.len(),
                self.stats.failures
            );
        }

        (records, std::mem::take(&mut self.stats))
    }

    fn finished(&self, n: usize, accepted: usize, max_failed: usize) -> bool {
        match self.delivery {
            DeliveryPolicy::BestEffort => self.stats.samples >= n,
            DeliveryPolicy::Backfill => accepted >= n || self.stats.failures >= max_failed,
        }
    }

    // -----------------------------------------------------------------------
    // One sample
    // -----------------------------------------------------------------------

    /// Produce one validated record for `prompt`, retrying per the policy.
    ///
    /// Returns the last attempt's error once attempts are exhausted, or
    /// [`GenerationError::Cancelled`] when the run is interrupted.
    pub async fn generate_one(&mut self, prompt: &PromptPayload) -> Result<Record, GenerationError> {
        let request = GenerationRequest::new(prompt.clone(), &self.llm);
        let policy = self.policy;
        let mut state = AttemptState::Pending;

        loop {
            state = state.advance(AttemptEvent::Begin, &policy);
            let attempt = state.attempt();

            match self.attempt(&request).await {
                Ok(record) => {
                    state = state.advance(AttemptEvent::Succeeded, &policy);
                    log::debug!("{} after {} attempt(s)", state.label(), state.attempt());
                    return Ok(record);
                }
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    self.stats.record_error(&err);
                    state = state.advance(AttemptEvent::Failed, &policy);
                    if state.is_terminal() {
                        return Err(err);
                    }
                    log::warn!(
                        "attempt {attempt}/{} failed: {err}",
                        policy.max_attempts
                    );
                    self.sleep_until(Instant::now() + policy.retry_delay).await?;
                }
            }
        }
    }

    /// One paced call plus parse, repair and validation.
    async fn attempt(&mut self, request: &GenerationRequest) -> Result<Record, GenerationError> {
        if let Some(last) = self.last_call {
            self.sleep_until(last + self.request_delay).await?;
        }
        self.last_call = Some(Instant::now());
        self.stats.attempts += 1;

        let mut cancel = self.cancel.clone();
        let response = tokio::select! {
            biased;
            _ = wait_cancelled(&mut cancel) => return Err(GenerationError::Cancelled),
            result = self.generator.generate(request) => result?,
        };
        log::debug!("response: {} chars", response.len());

        let processed = self
            .processor
            .process(&response, request.prompt.difficulty)?;
        for term in &processed.fallback_terms {
            log::warn!("no pronunciation rule for '{term}', used approximation");
        }
        self.stats.auto_fixed += processed.auto_fixed.len();
        self.stats.fallback_terms.extend(processed.fallback_terms);

        let result = self.validator.validate_record(&processed.record);
        if !result.ok {
            return Err(GenerationError::Validation(result.violations));
        }
        Ok(processed.record)
    }

    /// Sleep until `deadline` unless cancelled first.
    async fn sleep_until(&self, deadline: Instant) -> Result<(), GenerationError> {
        let mut cancel = self.cancel.clone();
        tokio::select! {
            biased;
            _ = wait_cancelled(&mut cancel) => Err(GenerationError::Cancelled),
            _ = tokio::time::sleep_until(deadline) => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::dataset::{validate_record, Difficulty};

    const VALID: &str = r#"{"origin": "Team cần review code", "spoken": "tím cần ri viu cốt",
        "en_word": ["Team", "review", "code"], "vi_spoken_word": ["tím", "ri viu", "cốt"],
        "type": "easy", "en_phrase": ["Team", "review", "code"]}"#;

    const TRUNCATED: &str = r#"{"origin": "Team cần review code", "spoken": "tím cần ri viu cốt",
        "en_word": ["Team", "review", "code"], "vi_spoken_word": ["tím", "ri viu"],
        "type": "easy", "en_phrase": ["Team", "review", "code"]}"#;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Fails every call with a timeout.
    #[derive(Default)]
    struct AlwaysFails {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for AlwaysFails {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GenerationError::Timeout)
        }
    }

    /// Returns the same text on every call.
    struct AlwaysOk(&'static str);

    #[async_trait]
    impl TextGenerator for AlwaysOk {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
    }

    /// Plays back scripted results, then answers `VALID`.
    struct Scripted {
        script: Mutex<VecDeque<Result<String, GenerationError>>>,
    }

    impl Scripted {
        fn new(script: Vec<Result<String, GenerationError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(VALID.to_string()))
        }
    }

    /// Records the scenario of every request.
    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<(String, String, Difficulty)>>,
    }

    #[async_trait]
    impl TextGenerator for Recording {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            let p = &request.prompt;
            self.seen
                .lock()
                .unwrap()
                .push((p.scenario.clone(), p.domain.clone(), p.difficulty));
            Ok(VALID.to_string())
        }
    }

    /// Answers `VALID` and raises the cancel flag on call number `at`.
    struct CancelAt {
        at: usize,
        calls: AtomicUsize,
        tx: watch::Sender<bool>,
    }

    #[async_trait]
    impl TextGenerator for CancelAt {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.at {
                let _ = self.tx.send(true);
            }
            Ok(VALID.to_string())
        }
    }

    /// Raises the cancel flag, then never answers.
    struct HangsAfterCancel {
        tx: watch::Sender<bool>,
    }

    #[async_trait]
    impl TextGenerator for HangsAfterCancel {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            let _ = self.tx.send(true);
            std::future::pending().await
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.generation.max_retries = 2;
        config.generation.retry_delay_ms = 0;
        config.generation.request_delay_ms = 0;
        config.generation.seed = Some(7);
        config
    }

    fn runner(generator: Arc<dyn TextGenerator>, config: &AppConfig) -> DatasetRunner {
        DatasetRunner::new(generator, Arc::new(PronunciationEngine::builtin()), config).unwrap()
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn always_failing_service_yields_zero_successes() {
        let generator = Arc::new(AlwaysFails::default());
        let mut r = runner(generator.clone(), &test_config());

        let (records, stats) = r.generate_dataset(5).await;

        assert!(records.is_empty());
        assert_eq!(stats.samples, 5);
        assert_eq!(stats.successes, 0);
        assert_eq!(stats.failures, 5);
        assert_eq!(stats.attempts, 15);
        assert_eq!(stats.api_errors, 15);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 15);
    }

    #[tokio::test]
    async fn valid_responses_fill_the_dataset() {
        let mut r = runner(Arc::new(AlwaysOk(VALID)), &test_config());

        let (records, stats) = r.generate_dataset(4).await;

        assert_eq!(records.len(), 4);
        assert_eq!(stats.successes, 4);
        assert_eq!(stats.attempts, 4);
        assert!(records.iter().all(|rec| validate_record(rec).ok));
    }

    #[tokio::test]
    async fn sample_recovers_after_api_and_parse_errors() {
        let generator = Arc::new(Scripted::new(vec![
            Err(GenerationError::RateLimited),
            Ok("Xin lỗi, tôi không hiểu yêu cầu.".into()),
        ]));
        let mut r = runner(generator, &test_config());

        let (records, stats) = r.generate_dataset(1).await;

        assert_eq!(records.len(), 1);
        assert_eq!(stats.attempts, 3);
        assert_eq!(stats.api_errors, 1);
        assert_eq!(stats.parse_errors, 1);
        assert_eq!(stats.failures, 0);
    }

    #[tokio::test]
    async fn invalid_records_are_retried_then_dropped() {
        let mut r = runner(Arc::new(AlwaysOk(TRUNCATED)), &test_config());

        let (records, stats) = r.generate_dataset(2).await;

        assert!(records.is_empty());
        assert_eq!(stats.validation_errors, 6);
        assert_eq!(stats.failures, 2);
    }

    #[tokio::test]
    async fn generate_one_returns_last_error_when_exhausted() {
        let mut r = runner(Arc::new(AlwaysOk(TRUNCATED)), &test_config());
        let prompt = PromptBuilder::new(Arc::new(PronunciationEngine::builtin())).build_prompt(
            &crate::llm::SampledScenario {
                context: "daily_standup".into(),
                domain: "software_development".into(),
                difficulty: Difficulty::Easy,
            },
        );

        match r.generate_one(&prompt).await {
            Err(GenerationError::Validation(v)) => assert!(!v.is_empty()),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(r.stats().attempts, 3);
    }

    #[tokio::test]
    async fn simple_responses_are_repaired_and_counted() {
        let mut r = runner(
            Arc::new(AlwaysOk(
                r#"{"text": "Team cần review code", "en_words": ["Team", "review", "code"]}"#,
            )),
            &test_config(),
        );

        let (records, stats) = r.generate_dataset(3).await;

        assert_eq!(records.len(), 3);
        assert_eq!(stats.auto_fixed, 9);
        assert_eq!(records[0].spoken, "tím cần ri viu cốt");
    }

    #[tokio::test]
    async fn backfill_replaces_failed_samples() {
        let generator = Arc::new(Scripted::new(vec![
            Err(GenerationError::Timeout),
            Err(GenerationError::Timeout),
            Err(GenerationError::Timeout),
        ]));
        let mut config = test_config();
        config.generation.delivery = DeliveryPolicy::Backfill;
        let mut r = runner(generator, &config);

        let (records, stats) = r.generate_dataset(2).await;

        assert_eq!(records.len(), 2);
        assert_eq!(stats.samples, 3);
        assert_eq!(stats.failures, 1);
    }

    #[tokio::test]
    async fn backfill_stops_at_failure_cap() {
        let mut config = test_config();
        config.generation.delivery = DeliveryPolicy::Backfill;
        let mut r = runner(Arc::new(AlwaysFails::default()), &config);

        let (records, stats) = r.generate_dataset(2).await;
        assert!(records.is_empty());
        assert_eq!(stats.failures, 4);

        config.generation.max_failed_samples = Some(1);
        let mut r = runner(Arc::new(AlwaysFails::default()), &config);
        let (_, stats) = r.generate_dataset(2).await;
        assert_eq!(stats.failures, 1);
    }

    #[tokio::test]
    async fn cancelled_run_makes_no_calls() {
        let generator = Arc::new(AlwaysFails::default());
        let (_tx, rx) = watch::channel(true);
        let mut r = runner(generator.clone(), &test_config()).with_cancel(rx);

        let (records, stats) = r.generate_dataset(5).await;

        assert!(records.is_empty());
        assert!(stats.cancelled);
        assert_eq!(stats.samples, 0);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_keeps_accepted_records() {
        let (tx, rx) = watch::channel(false);
        let generator = Arc::new(CancelAt {
            at: 2,
            calls: AtomicUsize::new(0),
            tx,
        });
        let mut r = runner(generator.clone(), &test_config()).with_cancel(rx);

        let (records, stats) = r.generate_dataset(10).await;

        assert_eq!(records.len(), 2);
        assert!(stats.cancelled);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancellation_interrupts_call_in_flight_without_retry() {
        let (tx, rx) = watch::channel(false);
        let mut r = runner(Arc::new(HangsAfterCancel { tx }), &test_config()).with_cancel(rx);

        let (records, stats) = r.generate_dataset(3).await;

        assert!(records.is_empty());
        assert!(stats.cancelled);
        assert_eq!(stats.attempts, 1);
        assert_eq!(stats.failures, 0);
        assert_eq!(stats.api_errors, 0);
    }

    #[tokio::test]
    async fn invalid_weights_fail_before_any_call() {
        let generator = Arc::new(AlwaysFails::default());
        let mut config = test_config();
        config.scenarios.difficulty_levels.insert("easy".into(), 0.9);

        let result = DatasetRunner::new(
            generator.clone(),
            Arc::new(PronunciationEngine::builtin()),
            &config,
        );

        assert!(matches!(result, Err(ConfigError::Weights { .. })));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn same_seed_draws_same_scenarios() {
        let a = Arc::new(Recording::default());
        let b = Arc::new(Recording::default());
        runner(a.clone(), &test_config()).generate_dataset(8).await;
        runner(b.clone(), &test_config()).generate_dataset(8).await;

        let seen_a = a.seen.lock().unwrap().clone();
        assert_eq!(seen_a.len(), 8);
        assert_eq!(seen_a, *b.seen.lock().unwrap());
    }

    #[tokio::test]
    async fn consecutive_calls_are_paced() {
        let mut config = test_config();
        config.generation.request_delay_ms = 40;
        let mut r = runner(Arc::new(AlwaysOk(VALID)), &config);

        let started = std::time::Instant::now();
        let (records, _) = r.generate_dataset(3).await;

        assert_eq!(records.len(), 3);
        assert!(started.elapsed() >= Duration::from_millis(80));
    }
}
