//! Core types for namesift classifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed ethnicity taxonomy used for downstream business classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ethnicity {
    African,
    Indian,
    CapeMalay,
    Coloured,
    White,
    Unknown,
}

impl Ethnicity {
    /// The five concrete categories in fixed dictionary-priority order.
    ///
    /// This order breaks exact confidence ties during dictionary lookup and
    /// must stay stable: African, Indian, Cape Malay, Coloured, White.
    pub const PRIORITY_ORDER: [Ethnicity; 5] = [
        Ethnicity::African,
        Ethnicity::Indian,
        Ethnicity::CapeMalay,
        Ethnicity::Coloured,
        Ethnicity::White,
    ];

    /// Human-readable label as used in prompts and dictionary assets
    pub fn label(&self) -> &'static str {
        match self {
            Self::African => "African",
            Self::Indian => "Indian",
            Self::CapeMalay => "Cape Malay",
            Self::Coloured => "Coloured",
            Self::White => "White",
            Self::Unknown => "Unknown",
        }
    }

    /// Tolerant parsing of free-form text (LLM answers, config files).
    ///
    /// Accepts any case, underscores or spaces, and common synonyms.
    /// Returns `None` for unrecognizable text; callers decide the fallback.
    pub fn parse_loose(text: &str) -> Option<Self> {
        let cleaned: String = text
            .trim()
            .trim_matches(|c: char| c == '.' || c == '"' || c == '\'')
            .to_lowercase()
            .replace(['_', '-'], " ");

        match cleaned.as_str() {
            "african" | "black" | "black african" => Some(Self::African),
            "indian" | "asian indian" | "south asian" => Some(Self::Indian),
            "cape malay" | "malay" | "capemalay" => Some(Self::CapeMalay),
            "coloured" | "colored" => Some(Self::Coloured),
            "white" | "european" | "caucasian" => Some(Self::White),
            "unknown" | "uncertain" | "n/a" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for Ethnicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Which cascade layer actually produced a classification.
///
/// `Cache` is the transport-level wrapper for results served verbatim from an
/// upstream result cache; it is distinct from `LearnedCache`, which serves
/// generalized patterns, not stored results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    RuleBased,
    Phonetic,
    LearnedCache,
    Llm,
    Cache,
}

impl std::fmt::Display for ClassificationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RuleBased => "rule_based",
            Self::Phonetic => "phonetic",
            Self::LearnedCache => "learned_cache",
            Self::Llm => "llm",
            Self::Cache => "cache",
        };
        f.write_str(s)
    }
}

/// Discrete confidence band derived deterministically from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    /// Band thresholds: ≥0.95 VeryHigh, ≥0.80 High, ≥0.65 Medium,
    /// ≥0.45 Low, else VeryLow.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.95 {
            Self::VeryHigh
        } else if confidence >= 0.80 {
            Self::High
        } else if confidence >= 0.65 {
            Self::Medium
        } else if confidence >= 0.45 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }
}

/// Method-specific detail payload attached to a classification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MethodDetail {
    /// Matched dictionary entry
    Dictionary {
        entry_name: String,
        name_type: String,
        frequency: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        linguistic_origin: Option<String>,
    },

    /// Phonetic or string-similarity match
    Phonetic {
        algorithm: String,
        code: String,
        /// How many independent algorithms agreed on the winning candidate
        agreements: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        similarity: Option<f64>,
    },

    /// LLM provider call detail
    Llm {
        provider: String,
        model: String,
        prompt_tokens: u32,
        completion_tokens: u32,
        cost_usd: f64,
    },
}

/// The unit of output of the classification engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    /// Post-normalization name, kept for audit
    pub name: String,

    /// Resolved ethnicity category
    pub ethnicity: Ethnicity,

    /// Confidence score in [0, 1]
    pub confidence: f64,

    /// The layer that actually produced this result
    pub method: ClassificationMethod,

    /// Band derived from `confidence`; always consistent with it
    pub confidence_level: ConfidenceLevel,

    /// Wall-clock time spent producing this result
    pub processing_time_ms: f64,

    /// When the classification was produced
    pub timestamp: DateTime<Utc>,

    /// Method-specific detail payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<MethodDetail>,
}

impl Classification {
    /// Create a new classification.
    ///
    /// Confidence is clamped to [0, 1] and the confidence level is derived
    /// here, so the confidence/level invariant holds by construction.
    pub fn new(
        name: impl Into<String>,
        ethnicity: Ethnicity,
        confidence: f64,
        method: ClassificationMethod,
    ) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        Self {
            name: name.into(),
            ethnicity,
            confidence,
            method,
            confidence_level: ConfidenceLevel::from_confidence(confidence),
            processing_time_ms: 0.0,
            timestamp: Utc::now(),
            detail: None,
        }
    }

    /// Attach a method-specific detail payload
    pub fn with_detail(mut self, detail: MethodDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Record the time spent producing this result
    pub fn with_processing_time(mut self, elapsed_ms: f64) -> Self {
        self.processing_time_ms = elapsed_ms;
        self
    }

    /// Check whether the score clears a cascade threshold
    pub fn meets_threshold(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}

/// Optional caller-supplied context threaded into LLM prompts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
}

impl ClassificationContext {
    pub fn is_empty(&self) -> bool {
        self.company_name.is_none() && self.province.is_none()
    }
}
