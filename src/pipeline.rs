use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::classifier::{build_classifier, ensure_matches_labels, ImageClassifier};
use crate::config::Config;
use crate::labels::ClassLabelTable;
use crate::metrics;
use crate::models::{PredictionResult, Preprocessed, Result, UploadedImage};
use crate::processing::{preprocess_file, validate_upload, LocalImageStorage};

/// Upload → preprocess → predict pipeline.
///
/// Built once at startup and shared by every request; nothing in it is
/// mutated afterwards.
pub struct InferencePipeline {
    config: Config,
    storage: LocalImageStorage,
    classifier: Arc<dyn ImageClassifier>,
    labels: ClassLabelTable,
}

impl InferencePipeline {
    pub fn new(config: Config, classifier: Arc<dyn ImageClassifier>, labels: ClassLabelTable) -> Result<Self> {
        ensure_matches_labels(classifier.as_ref(), &labels)?;
        let storage = LocalImageStorage::new(&config)?;
        Ok(Self {
            config,
            storage,
            classifier,
            labels,
        })
    }

    /// Loads the label table and classifier named by the configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let labels = match &config.labels_path {
            Some(path) => ClassLabelTable::load(path)?,
            None => ClassLabelTable::flowers(),
        };
        let classifier = build_classifier(&config, &labels)?;
        Self::new(config, classifier, labels)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn labels(&self) -> &ClassLabelTable {
        &self.labels
    }

    pub fn storage(&self) -> &LocalImageStorage {
        &self.storage
    }

    /// Runs every stage for one upload. Blocking; call from a blocking thread.
    pub fn process_upload(&self, upload: UploadedImage) -> Result<PredictionResult> {
        let upload_path = self.ingest(&upload)?;
        let preprocessed = self.preprocess(&upload_path)?;
        self.predict_and_respond(&upload_path, preprocessed)
    }

    /// Validates the upload and writes it to the upload directory
    pub fn ingest(&self, upload: &UploadedImage) -> Result<PathBuf> {
        let stored_name = validate_upload(upload, self.config.file_naming)?;
        self.storage.save_upload(&stored_name, &upload.bytes)
    }

    pub fn preprocess(&self, upload_path: &Path) -> Result<Preprocessed> {
        preprocess_file(upload_path, self.config.resize_filter)
    }

    /// Scores the tensor, picks the label and stores the display copy
    pub fn predict_and_respond(&self, upload_path: &Path, preprocessed: Preprocessed) -> Result<PredictionResult> {
        let started = Instant::now();
        let scores = self.classifier.predict(&preprocessed.tensor)?;
        let took_ms = started.elapsed().as_millis() as u64;
        metrics::record_inference_latency(took_ms);

        let (index, label, score) = self.labels.select(&scores)?;

        let file_name = upload_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.storage.save_processed(&file_name, &preprocessed.resized)?;

        tracing::info!(
            file = %file_name,
            label = %label,
            class_index = index,
            score = score,
            took.ms = took_ms,
            "Image classified"
        );

        Ok(PredictionResult {
            label: label.to_string(),
            score,
            image_url: self.storage.processed_url(&file_name),
            stored_file_name: file_name,
        })
    }
}
