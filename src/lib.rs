//! ToneMeter - emotional tone analysis of conversation screenshots.
//!
//! Chains OCR text extraction, a hosted tone-analysis model, and a local
//! SQLite record store behind a single pipeline orchestrator, with
//! fingerprint-based deduplication of previously analyzed images.

pub mod cli;
pub mod config;
pub mod fingerprint;
pub mod llm;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod storage;
pub mod store;
