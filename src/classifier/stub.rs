use crate::classifier::ImageClassifier;
use crate::models::{NormalizedTensor, PipelineError, Result};

/// Deterministic stand-in for the real model
#[derive(Debug, Clone)]
pub enum StubClassifier {
    /// Always returns the same scores
    Fixed(Vec<f32>),
    /// Buckets the mean pixel intensity across `classes` one-hot scores
    Brightness { classes: usize },
}

impl StubClassifier {
    pub fn fixed(scores: Vec<f32>) -> Self {
        StubClassifier::Fixed(scores)
    }

    pub fn brightness(classes: usize) -> Self {
        StubClassifier::Brightness { classes }
    }

    /// One-hot scores with the peak at `index`
    pub fn peaked(classes: usize, index: usize) -> Self {
        let mut scores = vec![0.0; classes];
        if let Some(slot) = scores.get_mut(index) {
            *slot = 1.0;
        }
        StubClassifier::Fixed(scores)
    }
}

impl ImageClassifier for StubClassifier {
    fn predict(&self, tensor: &NormalizedTensor) -> Result<Vec<f32>> {
        match self {
            StubClassifier::Fixed(scores) => Ok(scores.clone()),
            StubClassifier::Brightness { classes } => {
                if *classes == 0 {
                    return Err(PipelineError::Inference("stub classifier has no classes".to_string()));
                }
                let mean = tensor.mean().clamp(0.0, 1.0);
                let index = ((mean * *classes as f32) as usize).min(classes - 1);
                let mut scores = vec![0.0; *classes];
                scores[index] = 1.0;
                Ok(scores)
            }
        }
    }

    fn output_len(&self) -> Option<usize> {
        match self {
            StubClassifier::Fixed(scores) => Some(scores.len()),
            StubClassifier::Brightness { classes } => Some(*classes),
        }
    }
}
