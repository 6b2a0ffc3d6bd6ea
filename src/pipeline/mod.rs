//! Analysis pipeline orchestrator.
//!
//! Drives one session through the fixed stage sequence
//! extraction → tone analysis → persistence, with a fingerprint-based
//! shortcut that reuses a stored record when the same image was analyzed
//! before. Each stage is a hard boundary: the first failure aborts the run
//! and parks the session in `Failed` with a stage-tagged error.

mod error;
mod events;
mod gate;
mod session;

pub use error::{PersistenceError, PipelineError};
pub use events::{EventSink, NullSink, PipelineEvent};
pub use gate::{ImmediateGate, NotificationGate};
pub use session::{AnalysisSession, AnalysisStage};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::fingerprint;
use crate::llm::{ToneClient, ToneServiceError};
use crate::models::{EmotionRecord, ToneAnalysisResult};
use crate::ocr::{ExtractionError, TextExtractor};
use crate::storage::ImageStore;
use crate::store::RecordStore;

/// Text extraction collaborator as seen by the orchestrator.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn extract(&self, image_bytes: &[u8]) -> Result<String, ExtractionError>;
}

#[async_trait]
impl TextRecognizer for TextExtractor {
    async fn extract(&self, image_bytes: &[u8]) -> Result<String, ExtractionError> {
        TextExtractor::extract(self, image_bytes).await
    }
}

/// Tone analysis collaborator as seen by the orchestrator.
#[async_trait]
pub trait ToneAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<ToneAnalysisResult, ToneServiceError>;

    /// Model identifier recorded on persisted records.
    fn model_version(&self) -> String;
}

#[async_trait]
impl ToneAnalyzer for ToneClient {
    async fn analyze(&self, text: &str) -> Result<ToneAnalysisResult, ToneServiceError> {
        ToneClient::analyze(self, text).await
    }

    fn model_version(&self) -> String {
        self.config().model.clone()
    }
}

/// Default bound on the notification gate await.
const DEFAULT_GATE_TIMEOUT: Duration = Duration::from_secs(15);

/// Sequences one analysis session at a time over injected collaborators.
pub struct Orchestrator {
    recognizer: Arc<dyn TextRecognizer>,
    analyzer: Arc<dyn ToneAnalyzer>,
    store: RecordStore,
    images: ImageStore,
    gate: Arc<dyn NotificationGate>,
    events: Arc<dyn EventSink>,
    gate_timeout: Duration,
    session: AnalysisSession,
}

impl Orchestrator {
    pub fn new(
        recognizer: Arc<dyn TextRecognizer>,
        analyzer: Arc<dyn ToneAnalyzer>,
        store: RecordStore,
        images: ImageStore,
    ) -> Self {
        Self {
            recognizer,
            analyzer,
            store,
            images,
            gate: Arc::new(ImmediateGate),
            events: Arc::new(NullSink),
            gate_timeout: DEFAULT_GATE_TIMEOUT,
            session: AnalysisSession::default(),
        }
    }

    pub fn with_gate(mut self, gate: Arc<dyn NotificationGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_gate_timeout(mut self, timeout: Duration) -> Self {
        self.gate_timeout = timeout;
        self
    }

    /// Current session state.
    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }

    /// Begin a new session for the given image, clearing any previous run.
    pub fn select_image(&mut self, image_bytes: Vec<u8>) {
        self.session = AnalysisSession::with_image(image_bytes);
    }

    /// Clear the session back to `Idle` with all transient fields empty.
    pub fn reset(&mut self) {
        self.session = AnalysisSession::default();
    }

    /// Run the pipeline for the selected image.
    ///
    /// Exactly one stage is active at a time. A session in a terminal stage
    /// is returned unchanged; callers re-run via `reset()` or
    /// `select_image()`.
    pub async fn analyze(&mut self) -> &AnalysisSession {
        if self.session.stage != AnalysisStage::Idle {
            return &self.session;
        }

        let Some(image) = self.session.selected_image.clone() else {
            self.fail(PipelineError::NoImageSelected);
            return &self.session;
        };

        if self.try_dedup_shortcut(&image).await {
            return &self.session;
        }

        match self.run_stages(&image).await {
            Ok(record_id) => {
                self.session.saved_record_id = Some(record_id);
                self.session.stage = AnalysisStage::Completed;
                self.events.emit(PipelineEvent::RecordSaved { record_id });
                info!(%record_id, "analysis pipeline completed");
            }
            Err(err) => self.fail(err),
        }

        &self.session
    }

    /// Fingerprint the image and reuse a stored record when one matches.
    ///
    /// Returns true when the session was completed from the store. A lookup
    /// failure is absorbed and treated as a miss: dedup is an optimization,
    /// not a correctness requirement.
    async fn try_dedup_shortcut(&mut self, image: &[u8]) -> bool {
        let hash = fingerprint::fingerprint(image);
        if hash.is_empty() {
            return false;
        }

        match self.store.find_by_fingerprint(&hash).await {
            Ok(Some(record)) => {
                info!(record_id = %record.id, "duplicate image, reusing stored result");
                self.session.extracted_text = record.ocr_text.clone();
                self.session.result = Some(record.to_analysis_result());
                self.session.saved_record_id = Some(record.id);
                self.session.stage = AnalysisStage::Completed;
                self.events.emit(PipelineEvent::DuplicateDetected {
                    record_id: record.id,
                });
                true
            }
            Ok(None) => false,
            Err(err) => {
                warn!("duplicate lookup failed, continuing without dedup: {err}");
                false
            }
        }
    }

    async fn run_stages(&mut self, image: &[u8]) -> Result<Uuid, PipelineError> {
        // Stage 1: text extraction
        self.enter(AnalysisStage::PerformingExtraction);
        let text = self.recognizer.extract(image).await?;
        self.session.extracted_text = text.clone();
        self.events
            .emit(PipelineEvent::ExtractionSucceeded { chars: text.len() });

        // Pass-through await of the external notification gate. Bounded, and
        // never fails the pipeline.
        self.await_gate().await;

        // Stage 2: tone analysis
        self.enter(AnalysisStage::AnalyzingTone);
        let result = self.analyzer.analyze(&text).await?;
        self.session.result = Some(result.clone());
        self.events.emit(PipelineEvent::AnalysisSucceeded {
            tone_score: result.tone_score,
            tone_label: result.tone_label,
        });

        // Stage 3: persistence. Nothing is written unless both prior stages
        // succeeded, and the insert itself is a single atomic store op.
        self.enter(AnalysisStage::Persisting);
        let image_path = self
            .images
            .save(image)
            .map_err(PersistenceError::Image)?;
        let record = EmotionRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            image_path: image_path.display().to_string(),
            image_hash: fingerprint::fingerprint(image),
            ocr_text: text,
            tone_score: result.tone_score,
            tone_label: result.tone_label,
            tone_keywords: result.tone_keywords,
            model_version: self.analyzer.model_version(),
        };
        let record_id = record.id;
        self.store
            .insert(record)
            .await
            .map_err(PersistenceError::Store)?;

        Ok(record_id)
    }

    async fn await_gate(&self) {
        if tokio::time::timeout(self.gate_timeout, self.gate.await_completion())
            .await
            .is_err()
        {
            warn!("notification gate did not complete in time, continuing");
        }
    }

    fn enter(&mut self, stage: AnalysisStage) {
        self.session.stage = stage;
        self.events.emit(PipelineEvent::StageStarted { stage });
    }

    fn fail(&mut self, err: PipelineError) {
        warn!("analysis pipeline failed: {err}");
        let stage = self.session.stage;
        self.events.emit(PipelineEvent::PipelineFailed {
            stage,
            message: err.to_string(),
        });
        self.session.stage = AnalysisStage::Failed;
        self.session.last_error = Some(err);
    }
}
