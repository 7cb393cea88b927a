//! Self-learning classification cache
//!
//! Sits between the deterministic layers and the LLM layer: every successful
//! LLM classification is stored verbatim and generalized into a
//! phonetic-family pattern, and both are consulted before any new LLM call.
//!
//! A write-through in-memory layer makes a pattern learned from name A
//! usable for name B later in the same batch, with the SQLite store
//! providing durability across runs. Store I/O failures degrade to "no
//! cache hit" and never abort a classification.

use crate::pattern::{LearnedPattern, StoredClassification};
use crate::store::LearningStore;
use chrono::Utc;
use namesift_core::phonetic::refined_code;
use namesift_core::{
    Classification, ClassificationMethod, MethodDetail, NormalizedName, Result,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Length of the phonetic-family key: the first characters of the refined
/// consonant code of the name's phonetic key. This is the documented
/// generalization policy; changing it invalidates stored patterns.
pub const PATTERN_KEY_LEN: usize = 4;

/// A family match carries visibly lower confidence than a verbatim match
pub const FAMILY_CONFIDENCE_FACTOR: f64 = 0.9;

/// Hard ceiling for family-match confidence
pub const FAMILY_CONFIDENCE_CAP: f64 = 0.80;

#[derive(Default)]
struct MemoryState {
    verbatim: HashMap<String, StoredClassification>,
    patterns: HashMap<String, LearnedPattern>,
}

/// Aggregate numbers exposed for observability
#[derive(Debug, Clone, Serialize)]
pub struct LearningStatistics {
    /// Verbatim LLM classifications stored
    pub llm_classifications_stored: u64,
    /// Distinct active pattern families
    pub active_patterns: u64,
    /// Lookups served from pattern families
    pub patterns_applied: u64,
    /// patterns_applied / llm_classifications_stored; above 1.0 means each
    /// paid call covered more than one future name
    pub learning_efficiency: f64,
}

/// The learning cache: sole writer of learned patterns
pub struct LearningCache {
    store: LearningStore,
    session_id: String,
    memory: RwLock<MemoryState>,
}

impl LearningCache {
    /// Create a cache over a durable store, warming the in-memory layer
    /// from any previously persisted state
    pub fn new(store: LearningStore) -> Result<Self> {
        let (classifications, patterns) = store.load_all()?;
        let mut memory = MemoryState::default();
        for record in classifications {
            memory.verbatim.insert(record.name.clone(), record);
        }
        for pattern in patterns {
            memory.patterns.insert(pattern.pattern_key.clone(), pattern);
        }

        debug!(
            verbatim = memory.verbatim.len(),
            patterns = memory.patterns.len(),
            "learning cache warmed"
        );

        Ok(Self {
            store,
            session_id: uuid::Uuid::new_v4().to_string(),
            memory: RwLock::new(memory),
        })
    }

    /// Ephemeral cache for tests and one-off sessions
    pub fn in_memory() -> Result<Self> {
        Self::new(LearningStore::open_in_memory()?)
    }

    /// Derive the pattern-family key for a normalized name
    pub fn pattern_key(name: &NormalizedName) -> String {
        refined_code(&name.phonetic_key)
            .chars()
            .take(PATTERN_KEY_LEN)
            .collect()
    }

    /// Answer "have we already learned this?" before a new LLM call.
    ///
    /// Tries an exact verbatim match first, then a phonetic-family match at
    /// a visibly lower confidence. Returns `None` on any miss; store errors
    /// while recording an application are logged and swallowed.
    pub fn find_learned_classification(&self, name: &NormalizedName) -> Option<Classification> {
        {
            let memory = self.memory.read();
            if let Some(record) = memory.verbatim.get(&name.literal) {
                debug!(name = %name.literal, "learning cache verbatim hit");
                return Some(Classification::new(
                    name.literal.clone(),
                    record.ethnicity,
                    record.confidence,
                    ClassificationMethod::LearnedCache,
                ));
            }
        }

        let key = Self::pattern_key(name);
        if key.is_empty() {
            return None;
        }

        let now = Utc::now();
        let mut memory = self.memory.write();
        let pattern = memory.patterns.get_mut(&key)?;
        pattern.record_application(now);

        let confidence =
            (pattern.confidence * FAMILY_CONFIDENCE_FACTOR).min(FAMILY_CONFIDENCE_CAP);
        let result = Classification::new(
            name.literal.clone(),
            pattern.ethnicity,
            confidence,
            ClassificationMethod::LearnedCache,
        );
        debug!(name = %name.literal, pattern = %key, "learning cache family hit");
        drop(memory);

        if let Err(e) = self.store.record_application(&key, now) {
            warn!(pattern = %key, error = %e, "failed to persist pattern application");
        }

        Some(result)
    }

    /// Persist an LLM classification and generalize it into a pattern.
    ///
    /// Called by the orchestrator immediately after every successful LLM
    /// classification; the in-memory layer is updated first so the new
    /// knowledge is available to the very next lookup in the same batch.
    pub fn store_classification(
        &self,
        name: &NormalizedName,
        classification: &Classification,
    ) -> Result<()> {
        let provider = match &classification.detail {
            Some(MethodDetail::Llm { provider, .. }) => Some(provider.clone()),
            _ => None,
        };

        let record = StoredClassification {
            name: name.literal.clone(),
            ethnicity: classification.ethnicity,
            confidence: classification.confidence,
            provider,
            created_at: Utc::now(),
        };

        let key = Self::pattern_key(name);

        let pattern = {
            let mut memory = self.memory.write();
            memory.verbatim.insert(record.name.clone(), record.clone());

            if key.is_empty() {
                None
            } else {
                let pattern = memory
                    .patterns
                    .entry(key.clone())
                    .and_modify(|p| p.absorb(classification.ethnicity, classification.confidence))
                    .or_insert_with(|| {
                        LearnedPattern::new(
                            key.clone(),
                            classification.ethnicity,
                            classification.confidence,
                            self.session_id.clone(),
                        )
                    });
                Some(pattern.clone())
            }
        };

        self.store.put_classification(&record)?;
        if let Some(pattern) = pattern {
            self.store.confirm_pattern(&pattern)?;
        }
        Ok(())
    }

    /// Learning statistics for observability
    pub fn statistics(&self) -> LearningStatistics {
        let memory = self.memory.read();
        let stored = memory.verbatim.len() as u64;
        let applied: u64 = memory
            .patterns
            .values()
            .map(|p| p.total_applications as u64)
            .sum();

        LearningStatistics {
            llm_classifications_stored: stored,
            active_patterns: memory.patterns.len() as u64,
            patterns_applied: applied,
            learning_efficiency: if stored == 0 {
                0.0
            } else {
                applied as f64 / stored as f64
            },
        }
    }

    /// Compatibility shim for callers written against the older batch-flush
    /// learning design. Records are written immediately now, so there is
    /// never anything pending.
    pub fn flush_pending_records(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use namesift_core::{normalize, Ethnicity};

    fn llm_result(name: &NormalizedName, ethnicity: Ethnicity) -> Classification {
        Classification::new(
            name.literal.clone(),
            ethnicity,
            0.85,
            ClassificationMethod::Llm,
        )
        .with_detail(MethodDetail::Llm {
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
            prompt_tokens: 200,
            completion_tokens: 10,
            cost_usd: 0.0001,
        })
    }

    #[test]
    fn verbatim_hit_after_store() {
        let cache = LearningCache::in_memory().unwrap();
        let name = normalize("Gxowa").unwrap();
        cache.store_classification(&name, &llm_result(&name, Ethnicity::African)).unwrap();

        let hit = cache.find_learned_classification(&name).unwrap();
        assert_eq!(hit.ethnicity, Ethnicity::African);
        assert_eq!(hit.method, ClassificationMethod::LearnedCache);
        assert_eq!(hit.confidence, 0.85);
    }

    #[test]
    fn family_hit_for_phonetically_related_name_in_same_session() {
        let cache = LearningCache::in_memory().unwrap();
        let first = normalize("Gxowa").unwrap();
        cache.store_classification(&first, &llm_result(&first, Ethnicity::African)).unwrap();

        // Same refined-code family, never seen verbatim
        let second = normalize("Gxoba").unwrap();
        assert_eq!(
            LearningCache::pattern_key(&first),
            LearningCache::pattern_key(&second)
        );

        let hit = cache.find_learned_classification(&second).unwrap();
        assert_eq!(hit.ethnicity, Ethnicity::African);
        assert_eq!(hit.method, ClassificationMethod::LearnedCache);
        // Family matches are visibly weaker than verbatim matches
        assert!(hit.confidence < 0.85);
        assert!(hit.confidence <= FAMILY_CONFIDENCE_CAP);
    }

    #[test]
    fn unrelated_name_misses() {
        let cache = LearningCache::in_memory().unwrap();
        let name = normalize("Gxowa").unwrap();
        cache.store_classification(&name, &llm_result(&name, Ethnicity::African)).unwrap();

        let other = normalize("Pillay").unwrap();
        assert!(cache.find_learned_classification(&other).is_none());
    }

    #[test]
    fn statistics_reflect_learning_efficiency() {
        let cache = LearningCache::in_memory().unwrap();
        let first = normalize("Gxowa").unwrap();
        cache.store_classification(&first, &llm_result(&first, Ethnicity::African)).unwrap();

        // Two family applications from one paid call
        let second = normalize("Gxoba").unwrap();
        cache.find_learned_classification(&second).unwrap();
        let third = normalize("Gxobha").unwrap();
        cache.find_learned_classification(&third).unwrap();

        let stats = cache.statistics();
        assert_eq!(stats.llm_classifications_stored, 1);
        assert_eq!(stats.active_patterns, 1);
        assert_eq!(stats.patterns_applied, 2);
        assert!(stats.learning_efficiency > 1.0);
    }

    #[test]
    fn flush_shim_always_reports_zero() {
        let cache = LearningCache::in_memory().unwrap();
        assert_eq!(cache.flush_pending_records(), 0);
    }

    #[test]
    fn survives_restart_via_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learning.db");
        let name = normalize("Gxowa").unwrap();

        {
            let cache = LearningCache::new(LearningStore::open(&path).unwrap()).unwrap();
            cache.store_classification(&name, &llm_result(&name, Ethnicity::African)).unwrap();
        }

        let cache = LearningCache::new(LearningStore::open(&path).unwrap()).unwrap();
        let hit = cache.find_learned_classification(&name).unwrap();
        assert_eq!(hit.ethnicity, Ethnicity::African);
    }
}
