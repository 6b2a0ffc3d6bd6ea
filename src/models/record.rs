//! Persisted emotion analysis records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ToneAnalysisResult, ToneLabel};

/// One completed analysis, as persisted in the record store.
///
/// Records are immutable once written: they are created only after extraction
/// and analysis have both succeeded, and are removed only by explicit delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionRecord {
    pub id: Uuid,
    /// When the pipeline completed for this image.
    pub created_at: DateTime<Utc>,
    /// Path of the locally saved copy of the source image.
    pub image_path: String,
    /// Content fingerprint of the source image, lowercase hex.
    /// Empty when fingerprinting was unavailable for that run.
    pub image_hash: String,
    /// Text recognized from the image.
    pub ocr_text: String,
    /// Tone score, 0-100.
    pub tone_score: f64,
    pub tone_label: ToneLabel,
    pub tone_keywords: Vec<String>,
    /// Identifier of the model that produced the analysis.
    pub model_version: String,
}

impl EmotionRecord {
    /// Keywords in the comma-joined form used by the datastore column.
    pub fn joined_keywords(&self) -> String {
        self.tone_keywords.join(", ")
    }

    /// Split a comma-joined keyword column back into individual keywords.
    pub fn split_keywords(joined: &str) -> Vec<String> {
        joined
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect()
    }

    /// View this record as a tone analysis result, as used when a duplicate
    /// image short-circuits the pipeline.
    pub fn to_analysis_result(&self) -> ToneAnalysisResult {
        ToneAnalysisResult {
            tone_score: self.tone_score,
            tone_label: self.tone_label,
            tone_keywords: self.tone_keywords.clone(),
            reasoning: None,
        }
    }
}
