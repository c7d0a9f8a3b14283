pub mod prediction;

pub use prediction::*;

use thiserror::Error;

/// Message returned to clients when a POST carries no usable file.
pub const NO_FILE_SELECTED: &str = "No file selected";

#[derive(Debug, Error)]
pub enum PipelineError {
    // Displayed verbatim: the message is the client-facing body
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl PipelineError {
    pub fn no_file_selected() -> Self {
        PipelineError::Validation(NO_FILE_SELECTED.to_string())
    }

    /// Short machine-friendly name used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::PayloadTooLarge(_) => "payload_too_large",
            PipelineError::Decode(_) => "decode",
            PipelineError::Inference(_) => "inference",
            PipelineError::Storage(_) => "storage",
            PipelineError::Configuration(_) => "configuration",
            PipelineError::Template(_) => "template",
        }
    }

    /// True when the request itself was at fault rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::Validation(_) | PipelineError::PayloadTooLarge(_) | PipelineError::Decode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
