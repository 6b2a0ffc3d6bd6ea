//! Fire-and-forget pipeline progress events.

use uuid::Uuid;

use crate::models::ToneLabel;

use super::AnalysisStage;

/// Events emitted while a session runs.
///
/// The orchestrator emits these and ignores any outcome; sinks must not
/// block.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A stage began executing.
    StageStarted { stage: AnalysisStage },
    /// A previously analyzed image was recognized; stored results were reused
    /// and extraction/analysis were skipped.
    DuplicateDetected { record_id: Uuid },
    /// Extraction produced text.
    ExtractionSucceeded { chars: usize },
    /// Analysis produced a validated result.
    AnalysisSucceeded { tone_score: f64, tone_label: ToneLabel },
    /// The record was persisted and the run completed.
    RecordSaved { record_id: Uuid },
    /// The run failed at the given stage.
    PipelineFailed {
        stage: AnalysisStage,
        message: String,
    },
}

/// Receiver of pipeline events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Sink that discards all events.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: PipelineEvent) {}
}
