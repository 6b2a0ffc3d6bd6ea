//! Hosted tone analysis client.
//!
//! Talks to an OpenAI-compatible chat-completion endpoint and turns extracted
//! conversation text into a structured [`ToneAnalysisResult`].
//!
//! [`ToneAnalysisResult`]: crate::models::ToneAnalysisResult

mod client;
mod prompt;
mod protocol;

pub use client::{ToneClient, ToneClientConfig, ToneServiceError};
pub use prompt::PromptLocale;
