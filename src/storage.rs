//! Local image copies for persisted records.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use crate::fingerprint::canonical_jpeg;

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("image could not be encoded: {0}")]
    Encode(String),

    #[error("failed to write image: {0}")]
    Write(#[from] std::io::Error),
}

/// Saves JPEG copies of analyzed screenshots under an images directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    images_dir: PathBuf,
}

impl ImageStore {
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Save a JPEG copy of the image and return its path.
    pub fn save(&self, image_bytes: &[u8]) -> Result<PathBuf, ImageStoreError> {
        let encoded =
            canonical_jpeg(image_bytes).map_err(|e| ImageStoreError::Encode(e.to_string()))?;

        std::fs::create_dir_all(&self.images_dir)?;
        let path = self
            .images_dir
            .join(format!("conversation_{}.jpg", Uuid::new_v4()));
        std::fs::write(&path, encoded)?;
        Ok(path)
    }
}
