// SPDX-License-Identifier: MIT OR Apache-2.0
//! Broadcast-based progress events for one pipeline run (§4.6: "stage
//! enter, stage complete, error, warning"; §5: "per-pipeline FIFO").

use tokio::sync::broadcast;
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 64;

/// A named pipeline stage, in sequence order (§4.6 steps 2-9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Step 1: create or resume the Project record.
    CreateOrResume,
    /// Step 2: spec generation.
    SpecGeneration,
    /// Step 4: spec review.
    SpecReview,
    /// Step 5: code rendering.
    Render,
    /// Step 6: archive assembly.
    Archive,
    /// Step 8: persist the archive to storage.
    Store,
}

impl Stage {
    /// Stable name used in tracing and event payloads.
    pub fn name(self) -> &'static str {
        match self {
            Stage::CreateOrResume => "create_or_resume",
            Stage::SpecGeneration => "spec_generation",
            Stage::SpecReview => "spec_review",
            Stage::Render => "render",
            Stage::Archive => "archive",
            Stage::Store => "store",
        }
    }
}

/// One progress event for a single pipeline run, always carrying the
/// owning project id so a multi-pipeline consumer can demultiplex.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A stage started.
    StageEntered { project_id: Uuid, stage: Stage },
    /// A stage finished without error.
    StageCompleted { project_id: Uuid, stage: Stage },
    /// A stage raised a non-fatal concern but the pipeline continues.
    Warning { project_id: Uuid, stage: Stage, message: String },
    /// A stage failed and the pipeline is transitioning to `Failed`.
    Error { project_id: Uuid, stage: Stage, message: String },
}

impl PipelineEvent {
    /// The project this event belongs to.
    pub fn project_id(&self) -> Uuid {
        match self {
            PipelineEvent::StageEntered { project_id, .. }
            | PipelineEvent::StageCompleted { project_id, .. }
            | PipelineEvent::Warning { project_id, .. }
            | PipelineEvent::Error { project_id, .. } => *project_id,
        }
    }
}

/// Broadcast-based event bus for one pipeline run. Multiple runs each own
/// their own bus; there is no cross-pipeline ordering guarantee (§5).
pub struct EventBus {
    tx: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    /// Create a bus with the default channel capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus with an explicit channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Silently dropped if nobody is subscribed —
    /// event emission never blocks the pipeline (§4.6).
    pub fn publish(&self, event: PipelineEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_events_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let project_id = Uuid::new_v4();
        bus.publish(PipelineEvent::StageEntered { project_id, stage: Stage::SpecGeneration });
        bus.publish(PipelineEvent::StageCompleted { project_id, stage: Stage::SpecGeneration });

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(matches!(first, PipelineEvent::StageEntered { .. }));
        assert!(matches!(second, PipelineEvent::StageCompleted { .. }));
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish(PipelineEvent::StageEntered {
            project_id: Uuid::new_v4(),
            stage: Stage::Render,
        });
    }
}
