//! Session statistics collection and reporting

use namesift_core::ClassificationMethod;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Fixed-point scale for confidence and cost counters
const MICRO: f64 = 1_000_000.0;

/// Lock-free session statistics, shared across concurrent cascade workers
#[derive(Clone)]
pub struct SessionStats {
    inner: Arc<StatsInner>,
}

struct StatsInner {
    total_classified: AtomicU64,
    rule_hits: AtomicU64,
    phonetic_hits: AtomicU64,
    learned_hits: AtomicU64,
    llm_hits: AtomicU64,
    cache_hits: AtomicU64,
    unresolved: AtomicU64,
    failed: AtomicU64,
    /// Sum of confidences in micro-units (AtomicU64 carries no floats)
    confidence_sum_micro: AtomicU64,
    /// Sum of processing time in microseconds
    processing_time_us: AtomicU64,
    /// Cumulative LLM spend in micro-dollars
    llm_cost_micro_usd: AtomicU64,
}

impl SessionStats {
    /// Create a new zeroed stats collector
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StatsInner {
                total_classified: AtomicU64::new(0),
                rule_hits: AtomicU64::new(0),
                phonetic_hits: AtomicU64::new(0),
                learned_hits: AtomicU64::new(0),
                llm_hits: AtomicU64::new(0),
                cache_hits: AtomicU64::new(0),
                unresolved: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                confidence_sum_micro: AtomicU64::new(0),
                processing_time_us: AtomicU64::new(0),
                llm_cost_micro_usd: AtomicU64::new(0),
            }),
        }
    }

    /// Record a resolved classification
    pub fn record_hit(&self, method: ClassificationMethod, confidence: f64, elapsed_ms: f64) {
        self.inner.total_classified.fetch_add(1, Ordering::Relaxed);
        let counter = match method {
            ClassificationMethod::RuleBased => &self.inner.rule_hits,
            ClassificationMethod::Phonetic => &self.inner.phonetic_hits,
            ClassificationMethod::LearnedCache => &self.inner.learned_hits,
            ClassificationMethod::Llm => &self.inner.llm_hits,
            ClassificationMethod::Cache => &self.inner.cache_hits,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.inner
            .confidence_sum_micro
            .fetch_add((confidence * MICRO) as u64, Ordering::Relaxed);
        self.inner
            .processing_time_us
            .fetch_add((elapsed_ms * 1_000.0) as u64, Ordering::Relaxed);
    }

    /// Record a name that exhausted every layer without a result
    pub fn record_unresolved(&self, elapsed_ms: f64) {
        self.inner.total_classified.fetch_add(1, Ordering::Relaxed);
        self.inner.unresolved.fetch_add(1, Ordering::Relaxed);
        self.inner
            .processing_time_us
            .fetch_add((elapsed_ms * 1_000.0) as u64, Ordering::Relaxed);
    }

    /// Record a name that failed validation or errored internally
    pub fn record_failure(&self) {
        self.inner.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record LLM spend in dollars
    pub fn record_llm_cost(&self, cost_usd: f64) {
        self.inner
            .llm_cost_micro_usd
            .fetch_add((cost_usd * MICRO) as u64, Ordering::Relaxed);
    }

    /// Reset every counter to zero
    pub fn reset(&self) {
        self.inner.total_classified.store(0, Ordering::Relaxed);
        self.inner.rule_hits.store(0, Ordering::Relaxed);
        self.inner.phonetic_hits.store(0, Ordering::Relaxed);
        self.inner.learned_hits.store(0, Ordering::Relaxed);
        self.inner.llm_hits.store(0, Ordering::Relaxed);
        self.inner.cache_hits.store(0, Ordering::Relaxed);
        self.inner.unresolved.store(0, Ordering::Relaxed);
        self.inner.failed.store(0, Ordering::Relaxed);
        self.inner.confidence_sum_micro.store(0, Ordering::Relaxed);
        self.inner.processing_time_us.store(0, Ordering::Relaxed);
        self.inner.llm_cost_micro_usd.store(0, Ordering::Relaxed);
    }

    /// Get a consistent-enough snapshot of the current counters
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            total_classified: self.inner.total_classified.load(Ordering::Relaxed),
            rule_hits: self.inner.rule_hits.load(Ordering::Relaxed),
            phonetic_hits: self.inner.phonetic_hits.load(Ordering::Relaxed),
            learned_hits: self.inner.learned_hits.load(Ordering::Relaxed),
            llm_hits: self.inner.llm_hits.load(Ordering::Relaxed),
            cache_hits: self.inner.cache_hits.load(Ordering::Relaxed),
            unresolved: self.inner.unresolved.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            confidence_sum_micro: self.inner.confidence_sum_micro.load(Ordering::Relaxed),
            processing_time_us: self.inner.processing_time_us.load(Ordering::Relaxed),
            llm_cost_micro_usd: self.inner.llm_cost_micro_usd.load(Ordering::Relaxed),
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of session counters with derived rates
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub total_classified: u64,
    pub rule_hits: u64,
    pub phonetic_hits: u64,
    pub learned_hits: u64,
    pub llm_hits: u64,
    pub cache_hits: u64,
    pub unresolved: u64,
    pub failed: u64,
    confidence_sum_micro: u64,
    processing_time_us: u64,
    llm_cost_micro_usd: u64,
}

impl SessionSnapshot {
    fn rate(&self, count: u64) -> f64 {
        if self.total_classified == 0 {
            0.0
        } else {
            count as f64 / self.total_classified as f64
        }
    }

    pub fn rule_hit_rate(&self) -> f64 {
        self.rate(self.rule_hits)
    }

    pub fn phonetic_hit_rate(&self) -> f64 {
        self.rate(self.phonetic_hits)
    }

    pub fn learned_hit_rate(&self) -> f64 {
        self.rate(self.learned_hits)
    }

    /// Fraction of names that reached paid inference; the cost-optimization
    /// target is to keep this under 5%
    pub fn llm_usage_rate(&self) -> f64 {
        self.rate(self.llm_hits)
    }

    /// Mean confidence across resolved names
    pub fn avg_confidence(&self) -> f64 {
        let resolved = self.total_classified.saturating_sub(self.unresolved);
        if resolved == 0 {
            0.0
        } else {
            (self.confidence_sum_micro as f64 / MICRO) / resolved as f64
        }
    }

    /// Mean end-to-end processing time per name, in milliseconds
    pub fn avg_processing_time_ms(&self) -> f64 {
        if self.total_classified == 0 {
            0.0
        } else {
            (self.processing_time_us as f64 / 1_000.0) / self.total_classified as f64
        }
    }

    /// Cumulative LLM spend in dollars
    pub fn total_llm_cost_usd(&self) -> f64 {
        self.llm_cost_micro_usd as f64 / MICRO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_derive_from_counts() {
        let stats = SessionStats::new();
        stats.record_hit(ClassificationMethod::RuleBased, 0.9, 1.0);
        stats.record_hit(ClassificationMethod::RuleBased, 0.8, 1.0);
        stats.record_hit(ClassificationMethod::Llm, 0.85, 120.0);
        stats.record_unresolved(5.0);

        let snap = stats.snapshot();
        assert_eq!(snap.total_classified, 4);
        assert_eq!(snap.rule_hits, 2);
        assert_eq!(snap.llm_hits, 1);
        assert_eq!(snap.unresolved, 1);
        assert!((snap.rule_hit_rate() - 0.5).abs() < 1e-9);
        assert!((snap.llm_usage_rate() - 0.25).abs() < 1e-9);
        assert!((snap.avg_confidence() - 0.85).abs() < 1e-6);
    }

    #[test]
    fn cost_accumulates_in_micro_dollars() {
        let stats = SessionStats::new();
        stats.record_llm_cost(0.0015);
        stats.record_llm_cost(0.0025);
        assert!((stats.snapshot().total_llm_cost_usd() - 0.004).abs() < 1e-6);
    }

    #[test]
    fn reset_zeroes_everything() {
        let stats = SessionStats::new();
        stats.record_hit(ClassificationMethod::Phonetic, 0.7, 2.0);
        stats.record_llm_cost(1.0);
        stats.reset();

        let snap = stats.snapshot();
        assert_eq!(snap.total_classified, 0);
        assert_eq!(snap.phonetic_hits, 0);
        assert_eq!(snap.total_llm_cost_usd(), 0.0);
        assert_eq!(snap.avg_confidence(), 0.0);
    }

    #[test]
    fn empty_snapshot_rates_are_zero() {
        let snap = SessionStats::new().snapshot();
        assert_eq!(snap.rule_hit_rate(), 0.0);
        assert_eq!(snap.avg_processing_time_ms(), 0.0);
    }
}
