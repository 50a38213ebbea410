use std::path::{Path, PathBuf};

use image::RgbImage;
use thiserror::Error;

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::error::BoxError;

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("photo not found: {0}")]
    NotFound(PathBuf),
    #[error("unsupported photo format: {0}")]
    UnsupportedFormat(PathBuf),
}

/// Decodes a background photo to RGB.
pub trait PhotoReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<RgbImage, BoxError>;
}

pub fn is_supported_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Checks the photo exists and has an extension the pipeline decodes.
pub fn validate_photo(path: &Path) -> Result<(), PhotoError> {
    if !path.is_file() {
        return Err(PhotoError::NotFound(path.to_path_buf()));
    }
    if !is_supported_photo(path) {
        return Err(PhotoError::UnsupportedFormat(path.to_path_buf()));
    }
    Ok(())
}
