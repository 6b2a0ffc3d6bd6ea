//! Spinner-based progress display for pipeline events.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::pipeline::{EventSink, PipelineEvent};

/// Event sink that drives an indicatif spinner.
pub struct ProgressSink {
    bar: ProgressBar,
}

impl ProgressSink {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .expect("valid spinner template"),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for ProgressSink {
    fn emit(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::StageStarted { stage } => {
                self.bar.set_message(format!("{}...", stage.describe()));
            }
            PipelineEvent::DuplicateDetected { .. } => {
                self.bar.set_message("already analyzed, loading stored result");
            }
            PipelineEvent::ExtractionSucceeded { chars } => {
                self.bar.set_message(format!("recognized {chars} characters"));
            }
            PipelineEvent::AnalysisSucceeded { tone_score, .. } => {
                self.bar.set_message(format!("scored {tone_score:.0}/100"));
            }
            PipelineEvent::RecordSaved { .. } | PipelineEvent::PipelineFailed { .. } => {
                self.bar.finish_and_clear();
            }
        }
    }
}
