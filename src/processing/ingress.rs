use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::config::FileNaming;
use crate::models::{PipelineError, Result, UploadedImage};

static DISALLOWED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid filename regex"));

const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM0", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT0", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Reduces a client-supplied filename to a safe single path component.
///
/// Accented letters are folded to ASCII (NFKD, then combining marks
/// dropped), path separators become word breaks, whitespace runs become
/// `_`, and anything outside `[A-Za-z0-9_.-]` is dropped. May return an
/// empty string.
pub fn sanitize_filename(name: &str) -> String {
    let folded: String = name.nfkd().filter(char::is_ascii).collect();
    let spaced = folded.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let stripped = DISALLOWED_CHARS.replace_all(&joined, "");
    let trimmed = stripped.trim_matches(|c| c == '.' || c == '_');

    let stem = trimmed.split('.').next().unwrap_or_default().to_ascii_uppercase();
    if !trimmed.is_empty() && WINDOWS_DEVICE_NAMES.contains(&stem.as_str()) {
        format!("_{}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Checks the upload and decides the name it is stored under
pub fn validate_upload(upload: &UploadedImage, naming: FileNaming) -> Result<String> {
    // An empty payload counts as no file at all
    if upload.file_name.trim().is_empty() || upload.bytes.is_empty() {
        return Err(PipelineError::no_file_selected());
    }

    let sanitized = sanitize_filename(&upload.file_name);
    if sanitized.is_empty() {
        return Err(PipelineError::Validation(format!(
            "Invalid file name: {:?}",
            upload.file_name
        )));
    }

    Ok(match naming {
        FileNaming::Original => sanitized,
        FileNaming::ContentHash => content_hash_name(&upload.bytes, &sanitized),
    })
}

/// `<sha256-hex>[.<ext>]`, keeping the extension of an already sanitized name
pub fn content_hash_name(bytes: &[u8], sanitized: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = format!("{:x}", hasher.finalize());

    match sanitized.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("{}.{}", digest, ext.to_ascii_lowercase()),
        _ => digest,
    }
}
