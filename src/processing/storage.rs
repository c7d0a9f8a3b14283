use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};

use crate::config::Config;
use crate::models::Result;

/// Local-disk storage for uploaded originals and their processed copies
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    upload_dir: PathBuf,
    processed_dir: PathBuf,
    processed_url_prefix: String,
}

impl LocalImageStorage {
    /// Creates the storage, making sure both directories exist
    pub fn new(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.upload_folder)?;
        fs::create_dir_all(&config.processed_folder)?;

        Ok(Self {
            upload_dir: config.upload_folder.clone(),
            processed_dir: config.processed_folder.clone(),
            processed_url_prefix: config.processed_url_prefix(),
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    /// Writes the raw upload; an existing file with the same name is replaced
    pub fn save_upload(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.upload_dir.join(file_name);
        fs::write(&path, bytes)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Stored upload");
        Ok(path)
    }

    /// Writes the resized image under the processed directory.
    ///
    /// The encoding follows the extension of `file_name` so the static
    /// server's content type matches the bytes. Extensions without an
    /// encoder (or no extension) get PNG.
    pub fn save_processed(&self, file_name: &str, image: &RgbImage) -> Result<PathBuf> {
        let format = display_format(file_name);
        let mut buffer = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), format)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, format!("{:?} encoding failed: {}", format, e)))?;

        let path = self.processed_dir.join(file_name);
        fs::write(&path, &buffer)?;
        tracing::debug!(path = %path.display(), format = ?format, bytes = buffer.len(), "Stored processed image");
        Ok(path)
    }

    /// Public URL under which a processed file is served
    pub fn processed_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.processed_url_prefix, file_name)
    }
}

fn display_format(file_name: &str) -> ImageFormat {
    match ImageFormat::from_path(file_name) {
        Ok(format @ (ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif)) => format,
        _ => ImageFormat::Png,
    }
}
