//! Cost-monitored LLM classifier
//!
//! The most expensive cascade layer: few-shot prompts against a primary
//! provider with bounded retries, exponential backoff, an explicit per-call
//! timeout, and fallback to a secondary provider. Every call is gated by the
//! [`CostMonitor`] circuit breaker, and provider failures degrade to "no
//! result" rather than surfacing past this layer.

pub mod cost;
pub mod parse;
pub mod prompt;
pub mod provider;

pub use cost::{calculate_cost, CostMonitor, CostSnapshot};
pub use parse::{BATCH_MISS_CONFIDENCE, LLM_CONFIDENCE, UNPARSED_CONFIDENCE};
pub use prompt::PromptBuilder;
pub use provider::{AnthropicProvider, LlmProvider, OpenAiProvider, ProviderConfig};

use crate::config::LlmConfig;
use namesift_core::{
    Classification, ClassificationContext, ClassificationMethod, Error, MethodDetail,
    NormalizedName, Result,
};
use provider::ProviderResponse;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

struct ProviderCall {
    response: ProviderResponse,
    provider: String,
    model: String,
    cost_usd: f64,
}

/// LLM layer over one or more providers, primary first
pub struct LlmClassifier {
    providers: Vec<Arc<dyn LlmProvider>>,
    prompts: PromptBuilder,
    cost: Arc<CostMonitor>,
    config: LlmConfig,
}

impl LlmClassifier {
    /// Create the classifier. Having no provider at all is a
    /// construction-time configuration error, not a runtime condition.
    pub fn new(
        providers: Vec<Arc<dyn LlmProvider>>,
        prompts: PromptBuilder,
        cost: Arc<CostMonitor>,
        config: LlmConfig,
    ) -> Result<Self> {
        if providers.is_empty() {
            return Err(Error::config("llm classifier requires at least one provider"));
        }
        Ok(Self {
            providers,
            prompts,
            cost,
            config,
        })
    }

    /// The shared cost monitor
    pub fn cost_monitor(&self) -> &Arc<CostMonitor> {
        &self.cost
    }

    /// Classify one name. Budget exhaustion and provider failure both yield
    /// `Ok(None)`; the cascade decides what that means.
    pub async fn classify(
        &self,
        name: &NormalizedName,
        context: Option<&ClassificationContext>,
    ) -> Result<Option<Classification>> {
        if !self.cost.should_allow_request() {
            debug!(name = %name.literal, "llm budget exhausted, skipping");
            return Ok(None);
        }

        let prompt = self.prompts.single(&name.literal, context);
        let Some(call) = self.call_providers(&prompt).await else {
            return Ok(None);
        };

        let (ethnicity, confidence) = parse::parse_single(&call.response.text);
        Ok(Some(self.build_classification(
            &name.literal,
            ethnicity,
            confidence,
            &call,
            call.cost_usd,
        )))
    }

    /// Classify many names with numbered batch prompts.
    ///
    /// The result is aligned with the input; a chunk whose provider calls
    /// all fail contributes `None` slots, and budget exhaustion stops
    /// issuing new calls while leaving already-filled slots intact.
    pub async fn classify_batch(&self, names: &[NormalizedName]) -> Vec<Option<Classification>> {
        let mut results: Vec<Option<Classification>> = vec![None; names.len()];

        for (chunk_start, chunk) in names
            .chunks(self.config.batch_size.max(1))
            .scan(0usize, |offset, chunk| {
                let start = *offset;
                *offset += chunk.len();
                Some((start, chunk))
            })
        {
            if !self.cost.should_allow_request() {
                debug!(
                    remaining = names.len() - chunk_start,
                    "llm budget exhausted mid-batch, stopping"
                );
                break;
            }

            let literals: Vec<String> = chunk.iter().map(|n| n.literal.clone()).collect();
            let prompt = self.prompts.batch(&literals);
            let Some(call) = self.call_providers(&prompt).await else {
                continue;
            };

            let parsed = parse::parse_batch(&call.response.text, chunk.len());
            let per_name_cost = call.cost_usd / chunk.len() as f64;
            for (i, (ethnicity, confidence)) in parsed.into_iter().enumerate() {
                results[chunk_start + i] = Some(self.build_classification(
                    &chunk[i].literal,
                    ethnicity,
                    confidence,
                    &call,
                    per_name_cost,
                ));
            }
        }

        results
    }

    fn build_classification(
        &self,
        name: &str,
        ethnicity: namesift_core::Ethnicity,
        confidence: f64,
        call: &ProviderCall,
        cost_usd: f64,
    ) -> Classification {
        Classification::new(name, ethnicity, confidence, ClassificationMethod::Llm).with_detail(
            MethodDetail::Llm {
                provider: call.provider.clone(),
                model: call.model.clone(),
                prompt_tokens: call.response.prompt_tokens,
                completion_tokens: call.response.completion_tokens,
                cost_usd,
            },
        )
    }

    /// Try every provider in order, each with bounded retries, exponential
    /// backoff, and a hard per-call timeout. A timeout is treated exactly
    /// like a provider failure.
    async fn call_providers(&self, prompt: &str) -> Option<ProviderCall> {
        let deadline = Duration::from_secs(self.config.request_timeout_secs);

        for provider in &self.providers {
            for attempt in 0..=self.config.max_retries {
                if attempt > 0 {
                    let backoff = self.config.retry_backoff_ms * (1u64 << (attempt - 1));
                    sleep(Duration::from_millis(backoff)).await;
                }

                let outcome = timeout(deadline, provider.complete(prompt, self.config.max_tokens))
                    .await
                    .map_err(|_| Error::Timeout)
                    .and_then(|r| r);

                match outcome {
                    Ok(response) => {
                        let cost_usd = calculate_cost(
                            provider.model(),
                            response.prompt_tokens,
                            response.completion_tokens,
                        );
                        self.cost.track_usage(cost_usd);
                        debug!(
                            provider = provider.name(),
                            cost_usd, "llm call succeeded"
                        );
                        return Some(ProviderCall {
                            response,
                            provider: provider.name().to_string(),
                            model: provider.model().to_string(),
                            cost_usd,
                        });
                    }
                    Err(e) => {
                        warn!(
                            provider = provider.name(),
                            attempt,
                            error = %e,
                            "llm call failed"
                        );
                    }
                }
            }
        }

        warn!("all llm providers failed, degrading to no result");
        None
    }
}
