//! OCR engine abstraction.

use image::DynamicImage;

use super::ExtractionError;

/// Recognition accuracy tier requested from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OcrAccuracy {
    /// Faster, lower-quality recognition.
    Fast,
    /// Slower, higher-quality recognition.
    #[default]
    Accurate,
}

/// One candidate reading of a recognized line.
#[derive(Debug, Clone)]
pub struct TextCandidate {
    pub text: String,
    /// Engine confidence in `[0, 1]`.
    pub confidence: f32,
}

/// A single recognized line with its candidate readings.
///
/// Engines return lines in their native top-to-bottom order; the extractor
/// preserves that order when joining.
#[derive(Debug, Clone)]
pub struct RecognizedLine {
    pub candidates: Vec<TextCandidate>,
}

impl RecognizedLine {
    /// The highest-confidence candidate for this line, if any.
    pub fn best_candidate(&self) -> Option<&TextCandidate> {
        self.candidates.iter().max_by(|a, b| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

/// An OCR engine that recognizes text lines in a decoded image.
///
/// Recognition is CPU-bound and synchronous; callers are expected to move it
/// off their async executor (the extractor does this via `spawn_blocking`).
pub trait OcrEngine: Send + Sync {
    /// Engine name for logging.
    fn name(&self) -> &'static str;

    /// Recognize text lines in the image, top to bottom.
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RecognizedLine>, ExtractionError>;
}
