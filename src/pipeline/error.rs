//! Stage-tagged pipeline errors.

use thiserror::Error;

use crate::llm::ToneServiceError;
use crate::ocr::ExtractionError;
use crate::storage::ImageStoreError;
use crate::store::StoreError;

/// Failure of the persistence stage: either the local image copy or the
/// datastore write.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to save image copy: {0}")]
    Image(#[from] ImageStoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Top-level pipeline error, tagged by the stage that produced it.
///
/// Any failure aborts the run and moves the session to `Failed`; no stage is
/// retried automatically.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The caller never supplied an image.
    #[error("no image selected")]
    NoImageSelected,

    #[error("text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("tone analysis failed: {0}")]
    Service(#[from] ToneServiceError),

    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistenceError),
}
