pub mod stub;
pub mod tract;

pub use stub::*;
pub use tract::*;

use std::sync::Arc;

use crate::config::{ClassifierBackend, Config};
use crate::labels::ClassLabelTable;
use crate::models::{NormalizedTensor, PipelineError, Result};

/// Synchronous scoring backend: one normalized image in, one score per class out.
///
/// Implementations are loaded once and shared across requests, so they must
/// not rely on interior mutation.
pub trait ImageClassifier: Send + Sync {
    fn predict(&self, tensor: &NormalizedTensor) -> Result<Vec<f32>>;

    /// Number of scores `predict` returns, when the backend knows it up front
    fn output_len(&self) -> Option<usize> {
        None
    }
}

/// Builds the configured backend and checks it agrees with the label table
pub fn build_classifier(cfg: &Config, labels: &ClassLabelTable) -> Result<Arc<dyn ImageClassifier>> {
    let classifier: Arc<dyn ImageClassifier> = match cfg.classifier_backend {
        ClassifierBackend::Tract => Arc::new(TractClassifier::load(&cfg.model_path)?),
        ClassifierBackend::Stub => {
            tracing::warn!("Using stub classifier; predictions are not meaningful");
            Arc::new(StubClassifier::brightness(labels.len()))
        }
    };
    ensure_matches_labels(classifier.as_ref(), labels)?;
    Ok(classifier)
}

pub fn ensure_matches_labels(classifier: &dyn ImageClassifier, labels: &ClassLabelTable) -> Result<()> {
    match classifier.output_len() {
        Some(n) if n != labels.len() => Err(PipelineError::Configuration(format!(
            "classifier produces {} scores but the label table has {} entries",
            n,
            labels.len()
        ))),
        _ => Ok(()),
    }
}
