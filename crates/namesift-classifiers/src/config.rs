//! Cascade and LLM configuration

use serde::{Deserialize, Serialize};

/// Configuration for the classification cascade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Minimum confidence to accept a rule-based result
    #[serde(default = "default_rule_threshold")]
    pub rule_threshold: f64,

    /// Minimum confidence to accept a phonetic result
    #[serde(default = "default_phonetic_threshold")]
    pub phonetic_threshold: f64,

    /// When set, sub-threshold outcomes raise an error instead of
    /// returning `None`
    #[serde(default)]
    pub require_high_confidence: bool,

    /// Elevated acceptance bar used in require-high-confidence mode
    #[serde(default = "default_high_confidence_threshold")]
    pub high_confidence_threshold: f64,

    /// Worker-pool size for batch classification
    #[serde(default = "default_batch_workers")]
    pub batch_workers: usize,

    #[serde(default)]
    pub llm: LlmConfig,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            rule_threshold: default_rule_threshold(),
            phonetic_threshold: default_phonetic_threshold(),
            require_high_confidence: false,
            high_confidence_threshold: default_high_confidence_threshold(),
            batch_workers: default_batch_workers(),
            llm: LlmConfig::default(),
        }
    }
}

/// Configuration for the LLM layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Whether the LLM layer participates in the cascade at startup
    #[serde(default)]
    pub enabled: bool,

    /// Session spend ceiling in dollars
    #[serde(default = "default_session_cost_limit")]
    pub session_cost_limit: f64,

    /// Expected per-classification spend in dollars; observing a single
    /// call at five times this halts further requests
    #[serde(default = "default_per_classification_limit")]
    pub per_classification_limit: f64,

    /// Timeout for each provider call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries per provider before falling back
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff between retries; doubles per attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Names per batch prompt
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Few-shot examples per prompt (capped at 15)
    #[serde(default = "default_few_shot_examples")]
    pub few_shot_examples: usize,

    /// Completion-token ceiling per request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            session_cost_limit: default_session_cost_limit(),
            per_classification_limit: default_per_classification_limit(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            batch_size: default_batch_size(),
            few_shot_examples: default_few_shot_examples(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_rule_threshold() -> f64 {
    0.8
}

fn default_phonetic_threshold() -> f64 {
    0.6
}

fn default_high_confidence_threshold() -> f64 {
    0.8
}

fn default_batch_workers() -> usize {
    num_cpus::get().min(8)
}

fn default_session_cost_limit() -> f64 {
    5.0
}

fn default_per_classification_limit() -> f64 {
    0.01
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    250
}

fn default_batch_size() -> usize {
    25
}

fn default_few_shot_examples() -> usize {
    12
}

fn default_max_tokens() -> u32 {
    400
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = CascadeConfig::default();
        assert_eq!(config.rule_threshold, 0.8);
        assert_eq!(config.phonetic_threshold, 0.6);
        assert!(!config.require_high_confidence);
        assert!(!config.llm.enabled);
        assert_eq!(config.llm.batch_size, 25);
        assert!(config.llm.few_shot_examples <= 15);
    }

    #[test]
    fn partial_yaml_style_json_fills_defaults() {
        let config: CascadeConfig = serde_json::from_str(r#"{"rule_threshold": 0.9}"#).unwrap();
        assert_eq!(config.rule_threshold, 0.9);
        assert_eq!(config.phonetic_threshold, 0.6);
        assert_eq!(config.llm.max_retries, 2);
    }
}
