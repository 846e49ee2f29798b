//! Inference service
//!
//! Summarization never fails from the caller's point of view: while the
//! model is unloaded, loading or failed, callers get a truncated copy of the
//! cleaned text; if the model errors or times out they get the same with
//! zero confidence. Construction has no side effects; loading starts with
//! [`InferenceService::start`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info};

use super::state::ModelSlot;
use super::{
    ExtractiveLoader, InferenceError, ModelLoader, ModelOutput, ModelState, Summarizer, WorkerError,
    WorkerPool,
};
use crate::config::InferenceConfig;
use crate::heuristics::text::{clean_text, truncate_chars};
use crate::heuristics::{self, CalendarEvent, EfficiencyResult};

pub const DEFAULT_MAX_LENGTH: usize = 150;

/// Cleaned inputs shorter than this are returned verbatim
const SHORT_INPUT_CHARS: usize = 50;
const DEFAULT_MODEL_CONFIDENCE: f64 = 0.8;
const UNAVAILABLE_CONFIDENCE: f64 = 0.5;
const FAILED_CONFIDENCE: f64 = 0.0;
const MIN_LENGTH_CAP: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarizationResult {
    pub summary: String,
    /// In `[0, 1]`
    pub confidence_score: f64,
    /// Seconds
    pub processing_time: f64,
}

impl SummarizationResult {
    fn new(summary: String, confidence_score: f64, started: Instant) -> Self {
        Self {
            summary,
            confidence_score,
            processing_time: started.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub state: ModelState,
    pub model_name: String,
    pub load_attempts: u64,
    pub workers: usize,
    pub idle_workers: usize,
}

struct Inner {
    slot: ModelSlot,
    loader: Arc<dyn ModelLoader>,
    pool: WorkerPool,
    timeout: Duration,
}

#[derive(Clone)]
pub struct InferenceService {
    inner: Arc<Inner>,
}

impl InferenceService {
    /// Build the service around a loader. Does not start loading.
    pub fn new(loader: Arc<dyn ModelLoader>, pool: WorkerPool, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                slot: ModelSlot::new(),
                loader,
                pool,
                timeout,
            }),
        }
    }

    /// Build the service with the shipped extractive model and a dedicated
    /// inference pool. Must run inside a tokio runtime.
    pub fn from_config(config: &InferenceConfig) -> Result<Self, WorkerError> {
        let pool = WorkerPool::new("inference", config.workers)?;
        let loader = Arc::new(ExtractiveLoader::new(
            config.model_name.clone(),
            config.stopwords_path(),
        ));
        Ok(Self::new(loader, pool, config.timeout()))
    }

    /// Kick off background loading. Called once by the startup sequence.
    pub fn start(&self) -> bool {
        self.ensure_loading()
    }

    /// Start loading if nothing has been attempted yet. Returns whether this
    /// call started a load; concurrent and repeated calls are no-ops.
    pub fn ensure_loading(&self) -> bool {
        if !self.inner.slot.begin_load(&[ModelState::Unloaded]) {
            return false;
        }
        self.spawn_load();
        true
    }

    /// Retry after a failed load. No-op while loading or once ready.
    pub fn reload(&self) -> bool {
        if !self
            .inner
            .slot
            .begin_load(&[ModelState::Unloaded, ModelState::Failed])
        {
            return false;
        }
        info!("Reloading summarization model");
        self.spawn_load();
        true
    }

    fn spawn_load(&self) {
        let inner = Arc::clone(&self.inner);
        let loader = Arc::clone(&inner.loader);
        info!("Loading summarization model '{}' in background", loader.model_name());

        let job = inner.pool.submit(move || loader.load());
        self.inner.pool.spawn(async move {
            let result = job.join().await.map_err(InferenceError::from).and_then(|r| r);
            let name = inner.loader.model_name();
            match result {
                Ok(summarizer) => {
                    inner.slot.finish_ready(summarizer);
                    info!("Summarization model '{}' ready", name);
                }
                Err(e) => {
                    inner.slot.finish_failed();
                    error!("Failed to load summarization model '{}': {}", name, e);
                }
            }
        });
    }

    /// Wait until no load is in flight and report the resulting state
    pub async fn wait_until_settled(&self) -> ModelState {
        self.inner.slot.settled().await
    }

    pub fn state(&self) -> ModelState {
        self.inner.slot.state()
    }

    pub fn load_attempts(&self) -> u64 {
        self.inner.slot.attempts()
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            state: self.state(),
            model_name: self.inner.loader.model_name().to_string(),
            load_attempts: self.load_attempts(),
            workers: self.inner.pool.size(),
            idle_workers: self.inner.pool.available_slots(),
        }
    }

    pub async fn summarize(&self, text: &str, max_length: usize) -> SummarizationResult {
        let started = Instant::now();

        if text.trim().is_empty() {
            return SummarizationResult::new(String::new(), 0.0, started);
        }

        let cleaned = clean_text(text);
        let cleaned_len = cleaned.chars().count();
        if cleaned_len < SHORT_INPUT_CHARS {
            return SummarizationResult::new(cleaned, 1.0, started);
        }

        let Some(model) = self.inner.slot.summarizer() else {
            self.ensure_loading();
            debug!(
                state = self.state().as_str(),
                "Model unavailable, using truncation fallback"
            );
            return SummarizationResult::new(
                truncate_chars(&cleaned, max_length),
                UNAVAILABLE_CONFIDENCE,
                started,
            );
        };

        let min_length = MIN_LENGTH_CAP.min(cleaned_len / 4);
        match self.run_model(model, &cleaned, max_length, min_length).await {
            Ok(output) => {
                let confidence = output
                    .score
                    .map(f64::from)
                    .filter(|s| s.is_finite())
                    .unwrap_or(DEFAULT_MODEL_CONFIDENCE)
                    .clamp(0.0, 1.0);
                SummarizationResult::new(output.summary_text, confidence, started)
            }
            Err(e) => {
                // length only; the text itself may be private mail
                error!(input_len = cleaned_len, max_length, "Summarization failed: {}", e);
                SummarizationResult::new(
                    truncate_chars(&cleaned, max_length),
                    FAILED_CONFIDENCE,
                    started,
                )
            }
        }
    }

    async fn run_model(
        &self,
        model: Arc<dyn Summarizer>,
        text: &str,
        max_length: usize,
        min_length: usize,
    ) -> Result<ModelOutput, InferenceError> {
        let text = text.to_string();
        let job = self
            .inner
            .pool
            .submit(move || model.summarize(&text, max_length, min_length));

        match tokio::time::timeout(self.inner.timeout, job.join()).await {
            Ok(joined) => joined?,
            Err(_) => Err(InferenceError::Timeout(self.inner.timeout)),
        }
    }

    pub fn extract_tasks(&self, text: &str) -> Vec<String> {
        heuristics::extract_tasks(text)
    }

    pub fn categorize_file(&self, filename: &str) -> &'static str {
        heuristics::categorize_file(filename)
    }

    pub fn analyze_calendar_efficiency(&self, events: &[CalendarEvent]) -> EfficiencyResult {
        heuristics::analyze_calendar_efficiency(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum FakeModel {
        Scored(f32),
        Unscored,
        Failing,
        Slow(Duration),
        Panicking,
    }

    impl Summarizer for FakeModel {
        fn summarize(
            &self,
            text: &str,
            _max_length: usize,
            _min_length: usize,
        ) -> Result<ModelOutput, InferenceError> {
            let summary_text = format!("summary of {} chars", text.chars().count());
            match self {
                FakeModel::Scored(score) => Ok(ModelOutput {
                    summary_text,
                    score: Some(*score),
                }),
                FakeModel::Unscored => Ok(ModelOutput {
                    summary_text,
                    score: None,
                }),
                FakeModel::Failing => Err(InferenceError::Inference("tensor shape mismatch".into())),
                FakeModel::Slow(delay) => {
                    std::thread::sleep(*delay);
                    Ok(ModelOutput {
                        summary_text,
                        score: None,
                    })
                }
                FakeModel::Panicking => panic!("model crashed"),
            }
        }
    }

    struct FakeLoader {
        attempts: AtomicUsize,
        delay: Duration,
        failures: usize,
        model: Arc<FakeModel>,
    }

    impl FakeLoader {
        fn new(model: FakeModel) -> Arc<Self> {
            Self::build(model, Duration::ZERO, 0)
        }

        fn build(model: FakeModel, delay: Duration, failures: usize) -> Arc<Self> {
            Arc::new(Self {
                attempts: AtomicUsize::new(0),
                delay,
                failures,
                model: Arc::new(model),
            })
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    impl ModelLoader for FakeLoader {
        fn model_name(&self) -> &str {
            "fake"
        }

        fn load(&self) -> Result<Arc<dyn Summarizer>, InferenceError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            if attempt < self.failures {
                return Err(InferenceError::Load("weights missing".into()));
            }
            Ok(self.model.clone())
        }
    }

    fn service(loader: Arc<FakeLoader>, timeout: Duration) -> InferenceService {
        InferenceService::new(loader, WorkerPool::new("inference", 2).unwrap(), timeout)
    }

    fn long_text() -> String {
        "A".repeat(300)
    }

    fn truncated() -> String {
        format!("{}...", "A".repeat(150))
    }

    #[tokio::test]
    async fn test_construction_does_not_load() {
        let loader = FakeLoader::new(FakeModel::Unscored);
        let svc = service(loader.clone(), Duration::from_secs(5));
        tokio::task::yield_now().await;
        assert_eq!(svc.state(), ModelState::Unloaded);
        assert_eq!(svc.load_attempts(), 0);
        assert_eq!(loader.attempts(), 0);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let loader = FakeLoader::new(FakeModel::Unscored);
        let svc = service(loader.clone(), Duration::from_secs(5));

        for text in ["", "   \n\t"] {
            let result = svc.summarize(text, DEFAULT_MAX_LENGTH).await;
            assert_eq!(result.summary, "");
            assert_eq!(result.confidence_score, 0.0);
        }
        assert_eq!(svc.load_attempts(), 0);
    }

    #[tokio::test]
    async fn test_empty_input_when_ready() {
        let loader = FakeLoader::new(FakeModel::Scored(0.9));
        let svc = service(loader, Duration::from_secs(5));
        svc.start();
        assert_eq!(svc.wait_until_settled().await, ModelState::Ready);

        let result = svc.summarize("", DEFAULT_MAX_LENGTH).await;
        assert_eq!(result.summary, "");
        assert_eq!(result.confidence_score, 0.0);
    }

    #[tokio::test]
    async fn test_short_input_returned_clean() {
        let loader = FakeLoader::new(FakeModel::Unscored);
        let svc = service(loader, Duration::from_secs(5));

        let result = svc.summarize("<p>Hello   <b>team</b>, see you soon</p>", 150).await;
        assert_eq!(result.summary, "Hello team, see you soon");
        assert_eq!(result.confidence_score, 1.0);
        assert_eq!(svc.load_attempts(), 0);
    }

    #[tokio::test]
    async fn test_short_input_boundary() {
        let svc = service(FakeLoader::new(FakeModel::Unscored), Duration::from_secs(5));
        svc.start();
        assert_eq!(svc.wait_until_settled().await, ModelState::Ready);

        let just_under = "B".repeat(SHORT_INPUT_CHARS - 1);
        let result = svc.summarize(&just_under, 150).await;
        assert_eq!(result.summary, just_under);
        assert_eq!(result.confidence_score, 1.0);

        let at_limit = "B".repeat(SHORT_INPUT_CHARS);
        let result = svc.summarize(&at_limit, 150).await;
        assert_eq!(result.summary, "summary of 50 chars");
        assert_eq!(result.confidence_score, DEFAULT_MODEL_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_unloaded_triggers_load_without_waiting() {
        let loader = FakeLoader::build(FakeModel::Unscored, Duration::from_millis(500), 0);
        let svc = service(loader.clone(), Duration::from_secs(5));

        let result = svc.summarize(&long_text(), 150).await;
        assert_eq!(result.summary, truncated());
        assert_eq!(result.confidence_score, 0.5);
        assert!(result.processing_time < 0.25);
        assert_eq!(svc.state(), ModelState::Loading);

        assert_eq!(svc.wait_until_settled().await, ModelState::Ready);
        let result = svc.summarize(&long_text(), 150).await;
        assert_eq!(result.summary, "summary of 300 chars");
        assert_eq!(result.confidence_score, 0.8);
        assert_eq!(loader.attempts(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_triggers_load_once() {
        let loader = FakeLoader::build(FakeModel::Unscored, Duration::from_millis(100), 0);
        let svc = service(loader.clone(), Duration::from_secs(5));

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.ensure_loading() })
            })
            .collect();

        let mut started = 0;
        for task in tasks {
            if task.await.unwrap() {
                started += 1;
            }
        }

        assert_eq!(started, 1);
        assert_eq!(svc.wait_until_settled().await, ModelState::Ready);
        assert_eq!(loader.attempts(), 1);
        assert_eq!(svc.load_attempts(), 1);
        assert!(!svc.ensure_loading());
        assert!(!svc.start());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_summaries_while_unloaded_load_once() {
        let loader = FakeLoader::build(FakeModel::Unscored, Duration::from_millis(100), 0);
        let svc = service(loader.clone(), Duration::from_secs(5));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.summarize(&long_text(), 150).await })
            })
            .collect();
        for task in tasks {
            let result = task.await.unwrap();
            assert_eq!(result.confidence_score, 0.5);
        }

        svc.wait_until_settled().await;
        assert_eq!(loader.attempts(), 1);
    }

    #[tokio::test]
    async fn test_failed_model_falls_back_promptly() {
        let loader = FakeLoader::build(FakeModel::Unscored, Duration::ZERO, usize::MAX);
        let svc = service(loader.clone(), Duration::from_secs(5));
        svc.start();
        assert_eq!(svc.wait_until_settled().await, ModelState::Failed);

        let result = svc.summarize(&long_text(), 150).await;
        assert_eq!(result.summary, truncated());
        assert_eq!(result.summary.chars().count(), 153);
        assert_eq!(result.confidence_score, 0.5);
        assert!(result.processing_time < 1.0);

        // no automatic retry
        assert!(!svc.ensure_loading());
        assert_eq!(loader.attempts(), 1);
        assert_eq!(svc.state(), ModelState::Failed);
    }

    #[tokio::test]
    async fn test_inference_error_gives_zero_confidence() {
        let loader = FakeLoader::new(FakeModel::Failing);
        let svc = service(loader, Duration::from_secs(5));
        svc.start();
        svc.wait_until_settled().await;

        let result = svc.summarize(&long_text(), 150).await;
        assert_eq!(result.summary, truncated());
        assert_eq!(result.confidence_score, 0.0);
        assert!(result.processing_time < 1.0);
    }

    #[tokio::test]
    async fn test_model_panic_gives_zero_confidence() {
        let loader = FakeLoader::new(FakeModel::Panicking);
        let svc = service(loader, Duration::from_secs(5));
        svc.start();
        svc.wait_until_settled().await;

        let result = svc.summarize(&long_text(), 150).await;
        assert_eq!(result.summary, truncated());
        assert_eq!(result.confidence_score, 0.0);
    }

    #[tokio::test]
    async fn test_timeout_gives_zero_confidence() {
        let loader = FakeLoader::new(FakeModel::Slow(Duration::from_millis(400)));
        let svc = service(loader, Duration::from_millis(50));
        svc.start();
        svc.wait_until_settled().await;

        let result = svc.summarize(&long_text(), 150).await;
        assert_eq!(result.summary, truncated());
        assert_eq!(result.confidence_score, 0.0);
        assert!(result.processing_time < 0.3);
    }

    #[tokio::test]
    async fn test_model_score_mapping() {
        let svc = service(FakeLoader::new(FakeModel::Scored(0.93)), Duration::from_secs(5));
        svc.start();
        svc.wait_until_settled().await;
        let result = svc.summarize(&long_text(), 150).await;
        assert!((result.confidence_score - 0.93).abs() < 1e-6);

        let svc = service(FakeLoader::new(FakeModel::Scored(1.7)), Duration::from_secs(5));
        svc.start();
        svc.wait_until_settled().await;
        let result = svc.summarize(&long_text(), 150).await;
        assert_eq!(result.confidence_score, 1.0);
    }

    #[tokio::test]
    async fn test_reload_after_failure() {
        let loader = FakeLoader::build(FakeModel::Unscored, Duration::ZERO, 1);
        let svc = service(loader.clone(), Duration::from_secs(5));

        assert!(svc.start());
        assert_eq!(svc.wait_until_settled().await, ModelState::Failed);

        assert!(svc.reload());
        assert_eq!(svc.wait_until_settled().await, ModelState::Ready);
        assert_eq!(loader.attempts(), 2);
        assert_eq!(svc.load_attempts(), 2);

        // ready is terminal
        assert!(!svc.reload());
    }

    #[tokio::test]
    async fn test_status_reports_pool_and_model() {
        let svc = service(FakeLoader::new(FakeModel::Unscored), Duration::from_secs(5));
        let status = svc.status();
        assert_eq!(status.state, ModelState::Unloaded);
        assert_eq!(status.model_name, "fake");
        assert_eq!(status.workers, 2);
        assert_eq!(status.idle_workers, 2);
    }

    #[tokio::test]
    async fn test_extractive_end_to_end() {
        let svc = InferenceService::from_config(&InferenceConfig::default()).unwrap();
        svc.start();
        assert_eq!(svc.wait_until_settled().await, ModelState::Ready);

        let body = "<p>Hi all,</p><p>The launch review is moved to Thursday at 10am. \
            The launch checklist still needs owners for QA and docs. \
            Coffee will be provided. \
            Please add your name next to a launch checklist item.</p>\n-- \nPriya";
        let result = svc.summarize(body, 150).await;
        assert_eq!(result.confidence_score, 0.8);
        assert!(!result.summary.is_empty());
        assert!(result.summary.chars().count() <= 150);
        assert!(!result.summary.contains("Priya"));
    }

    #[tokio::test]
    async fn test_heuristics_always_available() {
        let svc = service(FakeLoader::new(FakeModel::Failing), Duration::from_secs(5));
        assert_eq!(svc.categorize_file("resume_2024.pdf"), "Resume/CV");
        assert!(svc.extract_tasks("").is_empty());
        assert_eq!(svc.analyze_calendar_efficiency(&[]).total_meetings, 0);
        assert_eq!(svc.state(), ModelState::Unloaded);
    }
}
