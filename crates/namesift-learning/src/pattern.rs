//! Learning domain model

use chrono::{DateTime, Utc};
use namesift_core::Ethnicity;
use serde::{Deserialize, Serialize};

/// Ceiling for learned-pattern confidence; learned knowledge never claims
/// dictionary-grade certainty
const PATTERN_CONFIDENCE_CAP: f64 = 0.95;

/// A verbatim LLM classification, persisted exactly as observed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredClassification {
    /// Normalized literal name
    pub name: String,
    pub ethnicity: Ethnicity,
    pub confidence: f64,
    /// Which provider produced the observation
    pub provider: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A generalized rule derived from one or more LLM classifications, keyed by
/// a phonetic-family fingerprint rather than an exact name.
///
/// Lifecycle: created on the first LLM classification of a novel family,
/// updated on every subsequent confirmation or application, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedPattern {
    pub pattern_key: String,
    pub ethnicity: Ethnicity,
    pub confidence: f64,
    /// How many LLM observations contributed to this pattern
    pub confirmation_count: u32,
    /// How many lookups this pattern has served
    pub total_applications: u32,
    /// Fraction of observations agreeing with the current ethnicity label
    pub success_rate: f64,
    pub created_from_session: String,
    pub last_applied_at: Option<DateTime<Utc>>,
}

impl LearnedPattern {
    /// Create a pattern from its first observation
    pub fn new(
        pattern_key: impl Into<String>,
        ethnicity: Ethnicity,
        confidence: f64,
        session: impl Into<String>,
    ) -> Self {
        Self {
            pattern_key: pattern_key.into(),
            ethnicity,
            confidence: confidence.clamp(0.0, PATTERN_CONFIDENCE_CAP),
            confirmation_count: 1,
            total_applications: 0,
            success_rate: 1.0,
            created_from_session: session.into(),
            last_applied_at: None,
        }
    }

    /// Fold a new observation into the pattern.
    ///
    /// Counts only ever increase. An agreeing observation raises confidence
    /// toward the cap; a disagreeing one lowers the success rate and scales
    /// confidence by it. When disagreeing observations reach a majority the
    /// row flips to the new ethnicity rather than being deleted.
    pub fn absorb(&mut self, ethnicity: Ethnicity, confidence: f64) {
        let agreeing = (self.success_rate * self.confirmation_count as f64).round() as u32;
        self.confirmation_count += 1;
        let total = self.confirmation_count;

        if ethnicity == self.ethnicity {
            let agreeing = agreeing + 1;
            self.success_rate = agreeing as f64 / total as f64;
            self.confidence = (self.confidence.max(confidence) * self.success_rate)
                .clamp(0.0, PATTERN_CONFIDENCE_CAP);
        } else {
            let disagreeing = total - agreeing;
            if disagreeing > agreeing {
                self.ethnicity = ethnicity;
                self.success_rate = disagreeing as f64 / total as f64;
            } else {
                self.success_rate = agreeing as f64 / total as f64;
            }
            self.confidence = (confidence * self.success_rate).clamp(0.0, PATTERN_CONFIDENCE_CAP);
        }
    }

    /// Record that this pattern served a lookup
    pub fn record_application(&mut self, at: DateTime<Utc>) {
        self.total_applications += 1;
        self.last_applied_at = Some(at);
    }
}
