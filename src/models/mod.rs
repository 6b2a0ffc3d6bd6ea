//! Data models for ToneMeter.

mod record;
mod tone;

pub use record::EmotionRecord;
pub use tone::{ToneAnalysisResult, ToneLabel};
