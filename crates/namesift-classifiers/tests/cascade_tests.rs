//! End-to-end cascade tests with a mocked LLM provider

use async_trait::async_trait;
use namesift_classifiers::llm::provider::ProviderResponse;
use namesift_classifiers::{
    BatchOptions, CascadeConfig, CascadeEngine, CostMonitor, LlmClassifier, LlmConfig,
    LlmProvider, PromptBuilder,
};
use namesift_core::{ClassificationMethod, Error, Ethnicity, Result};
use namesift_dictionary::DictionaryStore;
use namesift_learning::LearningCache;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Provider that always answers with a fixed category and counts its calls
struct FixedAnswerProvider {
    answer: &'static str,
    calls: AtomicUsize,
}

impl FixedAnswerProvider {
    fn new(answer: &'static str) -> Arc<Self> {
        Arc::new(Self {
            answer,
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for FixedAnswerProvider {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<ProviderResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderResponse {
            text: self.answer.to_string(),
            prompt_tokens: 500,
            completion_tokens: 5,
        })
    }

    fn name(&self) -> &str {
        "fixed"
    }

    fn model(&self) -> &str {
        "gpt-4o-mini"
    }
}

fn engine_without_llm() -> CascadeEngine {
    CascadeEngine::new(
        Arc::new(DictionaryStore::builtin()),
        Arc::new(LearningCache::in_memory().unwrap()),
        CascadeConfig::default(),
    )
}

fn engine_with_llm(provider: Arc<FixedAnswerProvider>) -> CascadeEngine {
    let dictionaries = Arc::new(DictionaryStore::builtin());
    let config = CascadeConfig {
        llm: LlmConfig {
            enabled: true,
            max_retries: 0,
            retry_backoff_ms: 1,
            ..LlmConfig::default()
        },
        ..CascadeConfig::default()
    };

    let monitor = Arc::new(CostMonitor::new(
        config.llm.session_cost_limit,
        config.llm.per_classification_limit,
    ));
    let llm = LlmClassifier::new(
        vec![provider as Arc<dyn LlmProvider>],
        PromptBuilder::new(&dictionaries, 5),
        monitor,
        config.llm.clone(),
    )
    .unwrap();

    CascadeEngine::new(
        dictionaries,
        Arc::new(LearningCache::in_memory().unwrap()),
        config,
    )
    .with_llm(Arc::new(llm))
}

#[tokio::test]
async fn dictionary_names_never_reach_the_llm() {
    let provider = FixedAnswerProvider::new("White");
    let engine = engine_with_llm(provider.clone());

    let result = engine.classify("Van Der Merwe").await.unwrap().unwrap();
    assert_eq!(result.ethnicity, Ethnicity::White);
    assert_eq!(result.method, ClassificationMethod::RuleBased);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn learning_round_trip_avoids_second_llm_call() {
    let provider = FixedAnswerProvider::new("African");
    let engine = engine_with_llm(provider.clone());

    // Unknown name goes all the way to the LLM
    let first = engine.classify("Gxowa").await.unwrap().unwrap();
    assert_eq!(first.method, ClassificationMethod::Llm);
    assert_eq!(first.ethnicity, Ethnicity::African);
    assert_eq!(provider.call_count(), 1);

    // A phonetically-related name in the same session resolves from the
    // learning cache without another paid call
    let second = engine.classify("Gxoba").await.unwrap().unwrap();
    assert_eq!(second.method, ClassificationMethod::LearnedCache);
    assert_eq!(second.ethnicity, Ethnicity::African);
    assert!(second.confidence < first.confidence);
    assert_eq!(provider.call_count(), 1);

    let stats = engine.learning_statistics();
    assert_eq!(stats.llm_classifications_stored, 1);
    assert_eq!(stats.active_patterns, 1);
    assert_eq!(stats.patterns_applied, 1);
}

#[tokio::test]
async fn verbatim_repeat_resolves_from_the_cache() {
    let provider = FixedAnswerProvider::new("Indian");
    let engine = engine_with_llm(provider.clone());

    let first = engine.classify("Vellupillai").await.unwrap().unwrap();
    let second = engine.classify("Vellupillai").await.unwrap().unwrap();

    assert_eq!(second.method, ClassificationMethod::LearnedCache);
    assert_eq!(second.ethnicity, first.ethnicity);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn batch_isolates_per_name_failures() {
    let engine = engine_without_llm();
    let names: Vec<String> = vec![
        "Dlamini".into(),
        " ".into(), // fails validation inside the cascade
        "Pillay".into(),
    ];

    let results = engine.classify_batch(&names).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().ethnicity, Ethnicity::African);
    assert!(results[1].is_none());
    assert_eq!(results[2].as_ref().unwrap().ethnicity, Ethnicity::Indian);
}

#[tokio::test]
async fn batch_reports_progress_per_completion() {
    let engine = engine_without_llm();
    let names: Vec<String> = vec!["Dlamini".into(), "Pillay".into(), "Botha".into()];

    let seen = Arc::new(AtomicUsize::new(0));
    let seen_in_callback = Arc::clone(&seen);
    let options = BatchOptions {
        progress: Some(Arc::new(move |done, total| {
            assert!(done <= total);
            seen_in_callback.fetch_add(1, Ordering::SeqCst);
        })),
        cancel: None,
    };

    let results = engine.classify_batch_with(&names, options).await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(Option::is_some));
    assert_eq!(seen.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn cancelled_batch_dispatches_no_new_work() {
    let engine = engine_without_llm();
    let names: Vec<String> = (0..20).map(|i| format!("name{}", i)).collect();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let options = BatchOptions {
        progress: None,
        cancel: Some(cancel),
    };

    let results = engine.classify_batch_with(&names, options).await;
    assert_eq!(results.len(), 20);
    assert!(results.iter().all(Option::is_none));
}

#[tokio::test]
async fn llm_usage_rate_is_observable() {
    let provider = FixedAnswerProvider::new("Coloured");
    let engine = engine_with_llm(provider);

    engine.classify("Dlamini").await.unwrap();
    engine.classify("Pillay").await.unwrap();
    engine.classify("Botha").await.unwrap();
    engine.classify("Gxowa").await.unwrap(); // the only paid call

    let stats = engine.get_session_stats();
    assert_eq!(stats.total_classified, 4);
    assert_eq!(stats.llm_hits, 1);
    assert!((stats.llm_usage_rate() - 0.25).abs() < 1e-9);
    assert!(stats.total_llm_cost_usd() > 0.0);
}

#[tokio::test]
async fn validation_errors_surface_from_single_classification() {
    let engine = engine_without_llm();
    assert!(matches!(
        engine.classify("").await,
        Err(Error::NameValidation(_))
    ));
}

#[tokio::test]
async fn disabled_llm_keeps_deterministic_layers_working() {
    let provider = FixedAnswerProvider::new("African");
    let engine = engine_with_llm(provider.clone());
    engine.disable_llm();

    // Dictionary hit still works
    let result = engine.classify("Naidoo").await.unwrap().unwrap();
    assert_eq!(result.ethnicity, Ethnicity::Indian);

    // Unknown name stops at None instead of paying for inference
    assert!(engine.classify("Gxowa").await.unwrap().is_none());
    assert_eq!(provider.call_count(), 0);

    assert!(engine.enable_llm());
    assert!(engine.classify("Gxowa").await.unwrap().is_some());
    assert_eq!(provider.call_count(), 1);
}
