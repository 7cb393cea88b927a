//! Classifier trait shared by the cascade layers

use async_trait::async_trait;
use namesift_core::{Classification, ClassificationMethod, NormalizedName, Result};

/// Trait for all cascade layers.
///
/// `Ok(None)` is the expected "nothing matched, try the next layer" outcome;
/// `Err` is reserved for genuine layer failures, which the cascade logs and
/// degrades past rather than surfacing.
#[async_trait]
pub trait NameClassifier: Send + Sync {
    /// Classify the given normalized name
    async fn classify(&self, name: &NormalizedName) -> Result<Option<Classification>>;

    /// Get the classifier name
    fn name(&self) -> &str;

    /// Which method this layer reports on its results
    fn method(&self) -> ClassificationMethod;
}
