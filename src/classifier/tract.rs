use std::path::Path;

use tract_onnx::prelude::*;

use crate::classifier::ImageClassifier;
use crate::models::{NormalizedTensor, PipelineError, Result};
use crate::processing::MODEL_INPUT_SIZE;

/// ONNX export of the pretrained classifier, run in-process with tract
pub struct TractClassifier {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
    output_len: Option<usize>,
}

impl TractClassifier {
    pub fn load(model_path: &Path) -> Result<Self> {
        let side = MODEL_INPUT_SIZE as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .and_then(|m| m.with_input_fact(0, f32::fact([1, side, side, 3]).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| {
                PipelineError::Configuration(format!("failed to load model {}: {}", model_path.display(), e))
            })?;

        // Last output dimension is the class count when the graph is fully typed
        let output_len = model
            .model()
            .output_fact(0)
            .ok()
            .and_then(|fact| fact.shape.as_concrete().and_then(|dims| dims.last().copied()));

        tracing::info!(
            path = %model_path.display(),
            output_len = ?output_len,
            "Loaded ONNX classifier"
        );

        Ok(Self { model, output_len })
    }
}

impl ImageClassifier for TractClassifier {
    fn predict(&self, tensor: &NormalizedTensor) -> Result<Vec<f32>> {
        let input = Tensor::from_shape(&tensor.shape(), &tensor.to_vec())
            .map_err(|e| PipelineError::Inference(format!("failed to build input tensor: {}", e)))?;

        let outputs = self
            .model
            .run(tvec!(input.into_tvalue()))
            .map_err(|e| PipelineError::Inference(format!("model run failed: {}", e)))?;

        let output = outputs
            .first()
            .ok_or_else(|| PipelineError::Inference("model produced no outputs".to_string()))?
            .to_array_view::<f32>()
            .map_err(|e| PipelineError::Inference(format!("unexpected output type: {}", e)))?;

        check_output_shape(output.shape())?;
        Ok(output.iter().copied().collect())
    }

    fn output_len(&self) -> Option<usize> {
        self.output_len
    }
}

/// Scores must be a single row: `[classes]` or `[1, classes]`
fn check_output_shape(shape: &[usize]) -> Result<()> {
    match shape {
        [_] | [1, _] => Ok(()),
        other => Err(PipelineError::Inference(format!("unexpected output shape {:?}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_single_row_outputs() {
        assert!(check_output_shape(&[79]).is_ok());
        assert!(check_output_shape(&[1, 79]).is_ok());
    }

    #[test]
    fn test_rejects_batched_and_spatial_outputs() {
        for shape in [&[2, 79][..], &[1, 7, 7, 79][..], &[][..]] {
            let err = check_output_shape(shape).unwrap_err();
            assert!(matches!(err, PipelineError::Inference(_)), "shape {:?}", shape);
        }
    }

    #[test]
    fn test_missing_model_is_configuration_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = TractClassifier::load(&tmp.path().join("absent.onnx")).err().unwrap();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert!(err.to_string().contains("absent.onnx"));
    }

    #[test]
    fn test_garbage_model_is_configuration_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.onnx");
        std::fs::write(&path, b"not a protobuf graph").unwrap();
        let err = TractClassifier::load(&path).err().unwrap();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
