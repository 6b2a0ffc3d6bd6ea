//! Per-run analysis session state.

use uuid::Uuid;

use crate::models::ToneAnalysisResult;

use super::PipelineError;

/// Stage of the analysis pipeline state machine.
///
/// `Completed` and `Failed` are terminal until [`reset`] returns the session
/// to `Idle`.
///
/// [`reset`]: super::Orchestrator::reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisStage {
    #[default]
    Idle,
    PerformingExtraction,
    AnalyzingTone,
    Persisting,
    Completed,
    Failed,
}

impl AnalysisStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Idle => "waiting",
            Self::PerformingExtraction => "recognizing text",
            Self::AnalyzingTone => "analyzing tone",
            Self::Persisting => "saving",
            Self::Completed => "done",
            Self::Failed => "failed",
        }
    }
}

/// Transient state of one pipeline run. Never persisted.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    /// Image bytes supplied by the caller.
    pub selected_image: Option<Vec<u8>>,
    /// Text produced by the extraction stage.
    pub extracted_text: String,
    /// Tone analysis output (or the stored result on a dedup hit).
    pub result: Option<ToneAnalysisResult>,
    /// Id of the persisted record for this run, set on completion and on
    /// dedup hits.
    pub saved_record_id: Option<Uuid>,
    pub stage: AnalysisStage,
    /// Stage-tagged error set when the session fails.
    pub last_error: Option<PipelineError>,
}

impl AnalysisSession {
    /// Fresh session for a newly selected image.
    pub fn with_image(image_bytes: Vec<u8>) -> Self {
        Self {
            selected_image: Some(image_bytes),
            ..Self::default()
        }
    }
}
