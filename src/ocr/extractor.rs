//! Pipeline-facing text extraction adapter.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::{OcrEngine, RecognizedLine};

/// Errors that can occur during text extraction.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    /// The supplied bytes are not a decodable image.
    #[error("image could not be decoded")]
    InvalidImage,

    /// Recognition succeeded but produced no text above the confidence
    /// threshold.
    #[error("no text found in image")]
    NoTextFound,

    /// The OCR engine itself failed.
    #[error("OCR processing failed: {0}")]
    ProcessingFailed(String),
}

/// Extracts text from image bytes using a pluggable OCR engine.
pub struct TextExtractor {
    engine: Arc<dyn OcrEngine>,
    /// Candidates below this confidence are discarded.
    min_confidence: f32,
}

impl TextExtractor {
    /// Default minimum confidence for recognized lines.
    pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

    /// Create an extractor over the given engine with the default threshold.
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            engine,
            min_confidence: Self::DEFAULT_MIN_CONFIDENCE,
        }
    }

    /// Set the minimum confidence threshold.
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Extract text from image bytes.
    ///
    /// Recognition runs on a blocking worker thread; the result is delivered
    /// once, with no partial output. For each recognized line only the
    /// highest-confidence candidate is kept, and candidates below the
    /// threshold are dropped. Surviving lines are joined with newlines in the
    /// engine's native top-to-bottom order.
    pub async fn extract(&self, image_bytes: &[u8]) -> Result<String, ExtractionError> {
        let img =
            image::load_from_memory(image_bytes).map_err(|_| ExtractionError::InvalidImage)?;

        let engine = Arc::clone(&self.engine);
        debug!(engine = engine.name(), "running OCR");
        let lines = tokio::task::spawn_blocking(move || engine.recognize(&img))
            .await
            .map_err(|e| ExtractionError::ProcessingFailed(e.to_string()))??;

        let text = self.assemble_text(&lines);
        if text.is_empty() {
            return Err(ExtractionError::NoTextFound);
        }

        debug!(chars = text.len(), lines = lines.len(), "OCR complete");
        Ok(text)
    }

    /// Keep the best candidate per line, filter by confidence, join with
    /// newlines.
    fn assemble_text(&self, lines: &[RecognizedLine]) -> String {
        lines
            .iter()
            .filter_map(|line| line.best_candidate())
            .filter(|candidate| candidate.confidence >= self.min_confidence)
            .map(|candidate| candidate.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
