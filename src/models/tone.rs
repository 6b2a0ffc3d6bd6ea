//! Tone analysis output types.

use serde::{Deserialize, Serialize};

/// Overall tone classification of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToneLabel {
    Positive,
    Neutral,
    Negative,
}

impl ToneLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Positive" => Some(Self::Positive),
            "Neutral" => Some(Self::Neutral),
            "Negative" => Some(Self::Negative),
            _ => None,
        }
    }
}

impl std::fmt::Display for ToneLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured result of one tone analysis call.
///
/// Invariants: `tone_score` is within `[0, 100]` and `tone_label` is one of
/// the three enumerated values. The client validates both before returning.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneAnalysisResult {
    /// Emotional tone score, 0 (very negative) to 100 (very positive).
    pub tone_score: f64,
    pub tone_label: ToneLabel,
    /// 3-5 short emotion words describing the conversation.
    pub tone_keywords: Vec<String>,
    /// Optional model-provided explanation of the scoring.
    pub reasoning: Option<String>,
}
