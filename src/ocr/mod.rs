//! Text recognition from conversation screenshots.
//!
//! The [`TextExtractor`] is the pipeline-facing adapter: it decodes the image,
//! runs an [`OcrEngine`] on a blocking worker thread, filters recognized lines
//! by confidence, and joins them into a single block of text.
//!
//! Tesseract (via the system binary) is the default engine; any other engine
//! can be plugged in through the [`OcrEngine`] trait.

mod engine;
mod extractor;
mod tesseract;

pub use engine::{OcrAccuracy, OcrEngine, RecognizedLine, TextCandidate};
pub use extractor::{ExtractionError, TextExtractor};
pub use tesseract::TesseractEngine;
