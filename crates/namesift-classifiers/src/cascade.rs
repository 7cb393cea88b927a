//! The classification cascade orchestrator
//!
//! Tries layers in cost order: rule-based, phonetic, learning cache, LLM.
//! Deterministic layers live in a data-driven strategy list (classifier +
//! threshold pairs); the learning cache and the LLM layer follow, wired
//! together so every paid answer is generalized for future reuse. The engine
//! is stateless across names; all shared state lives in the dictionary
//! store, the learning cache, and the session counters.

use crate::classifier::NameClassifier;
use crate::config::CascadeConfig;
use crate::llm::LlmClassifier;
use crate::phonetic::PhoneticClassifier;
use crate::rule_based::RuleBasedClassifier;
use futures::future::join_all;
use namesift_core::{
    normalize, Classification, ClassificationContext, Error, MethodDetail, Result,
};
use namesift_dictionary::DictionaryStore;
use namesift_learning::{LearningCache, LearningStatistics};
use namesift_telemetry::{SessionSnapshot, SessionStats};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Progress callback: (completed, total)
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Options for batch classification
#[derive(Clone, Default)]
pub struct BatchOptions {
    /// Invoked after each name completes
    pub progress: Option<ProgressFn>,

    /// Cooperative early termination: in-flight names finish, no new work
    /// is dispatched
    pub cancel: Option<CancellationToken>,
}

struct CascadeLayer {
    classifier: Arc<dyn NameClassifier>,
    threshold: f64,
}

/// The multi-layer classification engine
pub struct CascadeEngine {
    layers: Vec<CascadeLayer>,
    learning: Arc<LearningCache>,
    llm: Option<Arc<LlmClassifier>>,
    llm_enabled: AtomicBool,
    stats: SessionStats,
    config: CascadeConfig,
}

impl CascadeEngine {
    /// Build the standard cascade: rule-based then phonetic, thresholds from
    /// the config. The LLM layer is attached separately with [`with_llm`].
    ///
    /// [`with_llm`]: CascadeEngine::with_llm
    pub fn new(
        dictionaries: Arc<DictionaryStore>,
        learning: Arc<LearningCache>,
        config: CascadeConfig,
    ) -> Self {
        let layers = vec![
            CascadeLayer {
                classifier: Arc::new(RuleBasedClassifier::new(dictionaries.clone()))
                    as Arc<dyn NameClassifier>,
                threshold: config.rule_threshold,
            },
            CascadeLayer {
                classifier: Arc::new(PhoneticClassifier::new(dictionaries)),
                threshold: config.phonetic_threshold,
            },
        ];

        info!(
            rule_threshold = config.rule_threshold,
            phonetic_threshold = config.phonetic_threshold,
            "cascade engine initialized"
        );

        Self {
            layers,
            learning,
            llm: None,
            llm_enabled: AtomicBool::new(false),
            stats: SessionStats::new(),
            config,
        }
    }

    /// Attach the LLM layer; its startup enablement follows the config
    pub fn with_llm(mut self, llm: Arc<LlmClassifier>) -> Self {
        self.llm_enabled = AtomicBool::new(self.config.llm.enabled);
        self.llm = Some(llm);
        self
    }

    /// Append an extra deterministic layer (tried after the standard ones)
    pub fn with_layer(mut self, classifier: Arc<dyn NameClassifier>, threshold: f64) -> Self {
        self.layers.push(CascadeLayer {
            classifier,
            threshold,
        });
        self
    }

    /// Turn the LLM layer on. Returns false (and changes nothing) when no
    /// provider was configured at construction time.
    pub fn enable_llm(&self) -> bool {
        if self.llm.is_some() {
            self.llm_enabled.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    /// Turn the LLM layer off; deterministic layers keep working
    pub fn disable_llm(&self) {
        self.llm_enabled.store(false, Ordering::SeqCst);
    }

    pub fn is_llm_enabled(&self) -> bool {
        self.llm.is_some() && self.llm_enabled.load(Ordering::SeqCst)
    }

    /// Classify a single raw name
    pub async fn classify(&self, raw: &str) -> Result<Option<Classification>> {
        self.classify_with_context(raw, None).await
    }

    /// Classify a single raw name with caller-supplied context
    pub async fn classify_with_context(
        &self,
        raw: &str,
        context: Option<&ClassificationContext>,
    ) -> Result<Option<Classification>> {
        let start = Instant::now();
        let name = match normalize(raw) {
            Ok(name) => name,
            Err(e) => {
                self.stats.record_failure();
                return Err(e);
            }
        };

        let mut best_confidence: f64 = 0.0;

        for layer in &self.layers {
            match layer.classifier.classify(&name).await {
                Ok(Some(result)) => {
                    best_confidence = best_confidence.max(result.confidence);
                    if result.meets_threshold(self.acceptance_bar(layer.threshold)) {
                        return Ok(Some(self.finish(result, start)));
                    }
                    debug!(
                        layer = layer.classifier.name(),
                        confidence = result.confidence,
                        "sub-threshold result, continuing cascade"
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    // A layer failure degrades the cascade, never aborts it
                    warn!(
                        layer = layer.classifier.name(),
                        error = %e,
                        "layer failed, continuing cascade"
                    );
                }
            }
        }

        if let Some(hit) = self.learning.find_learned_classification(&name) {
            best_confidence = best_confidence.max(hit.confidence);
            if self.accepts(hit.confidence) {
                return Ok(Some(self.finish(hit, start)));
            }
        }

        if self.is_llm_enabled() {
            if let Some(llm) = &self.llm {
                match llm.classify(&name, context).await {
                    Ok(Some(result)) => {
                        if let Some(MethodDetail::Llm { cost_usd, .. }) = &result.detail {
                            self.stats.record_llm_cost(*cost_usd);
                        }
                        if let Err(e) = self.learning.store_classification(&name, &result) {
                            warn!(name = %name.literal, error = %e, "learning cache write failed");
                        }
                        best_confidence = best_confidence.max(result.confidence);
                        if self.accepts(result.confidence) {
                            return Ok(Some(self.finish(result, start)));
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(name = %name.literal, error = %e, "llm layer failed, continuing");
                    }
                }
            }
        }

        let elapsed_ms = elapsed_ms(start);
        self.stats.record_unresolved(elapsed_ms);

        if self.config.require_high_confidence {
            return Err(Error::ConfidenceThreshold {
                required: self.config.high_confidence_threshold,
                best: best_confidence,
            });
        }

        Ok(None)
    }

    /// Classify many names with bounded concurrency
    pub async fn classify_batch(&self, names: &[String]) -> Vec<Option<Classification>> {
        self.classify_batch_with(names, BatchOptions::default()).await
    }

    /// Batch classification with progress reporting and cancellation.
    ///
    /// Names run as independent cascades bounded by the configured worker
    /// count. One name's failure records `None` at its position and the
    /// batch continues.
    pub async fn classify_batch_with(
        &self,
        names: &[String],
        options: BatchOptions,
    ) -> Vec<Option<Classification>> {
        let semaphore = Arc::new(Semaphore::new(self.config.batch_workers.max(1)));
        let completed = Arc::new(AtomicUsize::new(0));
        let total = names.len();

        let futures = names.iter().map(|raw| {
            let semaphore = Arc::clone(&semaphore);
            let completed = Arc::clone(&completed);
            let progress = options.progress.clone();
            let cancel = options.cancel.clone();

            async move {
                if cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                    return None;
                }
                let _permit = semaphore.acquire().await.ok()?;
                if cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                    return None;
                }

                let result = self.classify(raw).await.ok().flatten();

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(progress) = &progress {
                    progress(done, total);
                }
                result
            }
        });

        join_all(futures).await
    }

    /// Session statistics snapshot
    pub fn get_session_stats(&self) -> SessionSnapshot {
        self.stats.snapshot()
    }

    /// Reset session statistics and the LLM cost monitor
    pub fn reset_session_stats(&self) {
        self.stats.reset();
        if let Some(llm) = &self.llm {
            llm.cost_monitor().reset();
        }
    }

    /// Learning-cache statistics
    pub fn learning_statistics(&self) -> LearningStatistics {
        self.learning.statistics()
    }

    /// Compatibility shim: learning records are written immediately, so
    /// there is never anything pending to flush. Always returns 0.
    pub fn flush_pending_learning_records(&self) -> usize {
        self.learning.flush_pending_records()
    }

    /// Effective acceptance bar for a deterministic layer
    fn acceptance_bar(&self, layer_threshold: f64) -> f64 {
        if self.config.require_high_confidence {
            layer_threshold.max(self.config.high_confidence_threshold)
        } else {
            layer_threshold
        }
    }

    /// Whether a learned or LLM result is acceptable under the current mode
    fn accepts(&self, confidence: f64) -> bool {
        !self.config.require_high_confidence
            || confidence >= self.config.high_confidence_threshold
    }

    fn finish(&self, result: Classification, start: Instant) -> Classification {
        let elapsed = elapsed_ms(start);
        self.stats
            .record_hit(result.method, result.confidence, elapsed);
        result.with_processing_time(elapsed)
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1_000.0
}
