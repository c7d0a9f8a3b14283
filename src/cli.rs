use std::path::Path;

use anyhow::{Context, Result};

use flower_classifier::{Config, InferencePipeline, UploadedImage};

/// Classifies a local image file through the same pipeline the web form uses
pub fn run_classify_cli(config: Config, image_path: &Path) -> Result<()> {
    let bytes = std::fs::read(image_path)
        .with_context(|| format!("failed to read {}", image_path.display()))?;
    let file_name = image_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let pipeline = InferencePipeline::from_config(config)?;
    let result = pipeline.process_upload(UploadedImage::new(file_name, bytes))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub fn print_usage() {
    println!("Flower Classifier");
    println!();
    println!("USAGE:");
    println!("    flower-classifier                 start the web server");
    println!("    flower-classifier classify <img>  classify a local image and print JSON");
    println!("    flower-classifier help            show this message");
    println!();
    println!("Configuration is read from the environment (and .env): PORT, UPLOAD_FOLDER,");
    println!("PROCESSED_FOLDER, MODEL_PATH, LABELS_PATH, CLASSIFIER_BACKEND, RESIZE_FILTER,");
    println!("FILE_NAMING, MAX_IMAGE_SIZE_MB, RETENTION_MAX_AGE_SECS, RETENTION_CRON.");
}
