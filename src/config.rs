use std::path::PathBuf;

use image::imageops::FilterType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierBackend {
    Tract,
    Stub,
}

impl ClassifierBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tract" | "onnx" => Some(ClassifierBackend::Tract),
            "stub" | "fake" => Some(ClassifierBackend::Stub),
            _ => None,
        }
    }
}

/// How stored files are named on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileNaming {
    /// Sanitized upload name; a second upload with the same name replaces the first
    Original,
    /// SHA-256 of the bytes plus the sanitized extension
    ContentHash,
}

impl FileNaming {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "original" | "filename" => Some(FileNaming::Original),
            "content_hash" | "hash" => Some(FileNaming::ContentHash),
            _ => None,
        }
    }
}

pub fn parse_filter(value: &str) -> Option<FilterType> {
    match value.trim().to_ascii_lowercase().as_str() {
        "nearest" => Some(FilterType::Nearest),
        "triangle" | "bilinear" => Some(FilterType::Triangle),
        "catmullrom" | "bicubic" => Some(FilterType::CatmullRom),
        "gaussian" => Some(FilterType::Gaussian),
        "lanczos3" | "lanczos" => Some(FilterType::Lanczos3),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub upload_folder: PathBuf,
    pub processed_folder: PathBuf,
    // Public prefix the static directories are mounted under
    pub static_url_prefix: String,
    pub model_path: PathBuf,
    // Optional label file; the built-in flower table is used otherwise
    pub labels_path: Option<PathBuf>,
    pub classifier_backend: ClassifierBackend,
    pub resize_filter: FilterType,
    pub file_naming: FileNaming,
    pub max_image_size_mb: u64,
    // 0 disables the retention sweeper
    pub retention_max_age_secs: u64,
    pub retention_cron: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            upload_folder: PathBuf::from("./static/uploads"),
            processed_folder: PathBuf::from("./static/processed"),
            static_url_prefix: "/static".to_string(),
            model_path: PathBuf::from("flower_classifier.onnx"),
            labels_path: None,
            classifier_backend: ClassifierBackend::Tract,
            resize_filter: FilterType::CatmullRom,
            file_naming: FileNaming::Original,
            max_image_size_mb: 50,
            retention_max_age_secs: 86_400,
            retention_cron: "0 */10 * * * *".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port: u16 = get("PORT").and_then(|s| s.parse().ok()).unwrap_or(defaults.port);
        let upload_folder = get("UPLOAD_FOLDER").map(PathBuf::from).unwrap_or(defaults.upload_folder);
        let processed_folder = get("PROCESSED_FOLDER").map(PathBuf::from).unwrap_or(defaults.processed_folder);
        let static_url_prefix = get("STATIC_URL_PREFIX")
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.static_url_prefix);
        let model_path = get("MODEL_PATH").map(PathBuf::from).unwrap_or(defaults.model_path);
        let labels_path = get("LABELS_PATH").filter(|s| !s.trim().is_empty()).map(PathBuf::from);

        let classifier_backend = match get("CLASSIFIER_BACKEND") {
            Some(raw) => ClassifierBackend::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unknown CLASSIFIER_BACKEND, using tract");
                defaults.classifier_backend
            }),
            None => defaults.classifier_backend,
        };
        let resize_filter = match get("RESIZE_FILTER") {
            Some(raw) => parse_filter(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unknown RESIZE_FILTER, using catmullrom");
                defaults.resize_filter
            }),
            None => defaults.resize_filter,
        };
        let file_naming = match get("FILE_NAMING") {
            Some(raw) => FileNaming::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unknown FILE_NAMING, using original");
                defaults.file_naming
            }),
            None => defaults.file_naming,
        };

        let max_image_size_mb: u64 = get("MAX_IMAGE_SIZE_MB").and_then(|s| s.parse().ok()).unwrap_or(defaults.max_image_size_mb);
        let retention_max_age_secs: u64 = get("RETENTION_MAX_AGE_SECS").and_then(|s| s.parse().ok()).unwrap_or(defaults.retention_max_age_secs);
        let retention_cron = get("RETENTION_CRON").filter(|s| !s.trim().is_empty()).unwrap_or(defaults.retention_cron);

        Self {
            port,
            upload_folder,
            processed_folder,
            static_url_prefix,
            model_path,
            labels_path,
            classifier_backend,
            resize_filter,
            file_naming,
            max_image_size_mb,
            retention_max_age_secs,
            retention_cron,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        (self.max_image_size_mb as usize).saturating_mul(1024 * 1024)
    }

    pub fn retention_enabled(&self) -> bool {
        self.retention_max_age_secs > 0
    }

    /// URL prefix for uploaded originals, e.g. `/static/uploads`
    pub fn uploads_url_prefix(&self) -> String {
        format!("{}/uploads", self.static_url_prefix)
    }

    /// URL prefix for processed copies, e.g. `/static/processed`
    pub fn processed_url_prefix(&self) -> String {
        format!("{}/processed", self.static_url_prefix)
    }
}
