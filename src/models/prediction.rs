use image::{ImageFormat, RgbImage};
use ndarray::{Array4, ArrayView4};
use serde::Serialize;

/// Raw upload as received from the HTTP layer
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Model input in NHWC layout with a batch dimension of one.
///
/// Values are channel intensities divided by 255, so always within [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor {
    data: Array4<f32>,
}

impl NormalizedTensor {
    pub(crate) fn from_array(data: Array4<f32>) -> Self {
        Self { data }
    }

    /// (batch, height, width, channels)
    pub fn shape(&self) -> [usize; 4] {
        let s = self.data.shape();
        [s[0], s[1], s[2], s[3]]
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    /// Values in row-major NHWC order
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    pub fn mean(&self) -> f32 {
        self.data.mean().unwrap_or(0.0)
    }
}

/// Output of the preprocess stage
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Resized RGB image, persisted for display
    pub resized: RgbImage,
    pub tensor: NormalizedTensor,
    pub source_format: ImageFormat,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredictionResult {
    pub label: String,
    pub score: f32,
    /// Public URL of the processed copy, e.g. `/static/processed/rose.png`
    pub image_url: String,
    pub stored_file_name: String,
}
