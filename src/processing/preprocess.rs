use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbImage};
use ndarray::Array4;

use crate::models::{NormalizedTensor, PipelineError, Preprocessed, Result};

/// Side length of the square input the classifier expects
pub const MODEL_INPUT_SIZE: u32 = 224;

/// Decodes, resizes and normalizes the image stored at `path`
pub fn preprocess_file(path: &Path, filter: FilterType) -> Result<Preprocessed> {
    let bytes = std::fs::read(path)?;
    preprocess_bytes(&bytes, filter)
}

pub fn preprocess_bytes(bytes: &[u8], filter: FilterType) -> Result<Preprocessed> {
    let (image, source_format) = decode_image(bytes)?;
    let resized = resize_canonical(&image, filter);
    let tensor = normalize(&resized);

    tracing::debug!(
        format = ?source_format,
        original_width = image.width(),
        original_height = image.height(),
        "Preprocessed image"
    );

    Ok(Preprocessed {
        resized,
        tensor,
        source_format,
    })
}

/// Sniffs the format from the bytes themselves, ignoring any file extension
pub fn decode_image(bytes: &[u8]) -> Result<(DynamicImage, ImageFormat)> {
    let format = image::guess_format(bytes)
        .map_err(|e| PipelineError::Decode(format!("unrecognized image data: {}", e)))?;
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| PipelineError::Decode(format!("failed to decode {:?} image: {}", format, e)))?;
    Ok((image, format))
}

/// Exact resize to the model input size; aspect ratio is not preserved and alpha is dropped
pub fn resize_canonical(image: &DynamicImage, filter: FilterType) -> RgbImage {
    let rgb = image.to_rgb8();
    if rgb.width() == MODEL_INPUT_SIZE && rgb.height() == MODEL_INPUT_SIZE {
        return rgb;
    }
    image::imageops::resize(&rgb, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, filter)
}

/// NHWC tensor with a leading batch dimension of one, each channel divided by 255
pub fn normalize(rgb: &RgbImage) -> NormalizedTensor {
    let (width, height) = rgb.dimensions();
    let data = Array4::from_shape_fn((1, height as usize, width as usize, 3), |(_, y, x, c)| {
        rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    });
    NormalizedTensor::from_array(data)
}
