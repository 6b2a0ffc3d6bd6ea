//! External notification gate awaited between extraction and analysis.

use async_trait::async_trait;

/// A gate the pipeline awaits once per run, between extraction and analysis.
///
/// This is a pass-through await, not a pipeline stage: it never fails the
/// pipeline, and the orchestrator bounds the wait so an unavailable gate host
/// cannot stall a session.
#[async_trait]
pub trait NotificationGate: Send + Sync {
    async fn await_completion(&self);
}

/// Gate that resolves immediately, used when no host is present.
pub struct ImmediateGate;

#[async_trait]
impl NotificationGate for ImmediateGate {
    async fn await_completion(&self) {}
}
