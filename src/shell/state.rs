use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::auth::AuthorizationGate;
use crate::store::event::{NewEvent, RecordedEvent};
use crate::store::{EventStore, EventStoreError};

/// The sole write path from application code into the event store.
///
/// Every call is counted, so tests can assert "recorded exactly N times"
/// (and, for denied requests, "never reached at all").
pub struct EventRecorder {
    store: Arc<dyn EventStore>,
    calls: AtomicU64,
}

impl EventRecorder {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            calls: AtomicU64::new(0),
        }
    }

    pub async fn record_event(&self, event: NewEvent) -> Result<RecordedEvent, EventStoreError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let recorded = self.store.add_event(event).await?;
        tracing::debug!(
            sequence_num = recorded.sequence_num,
            stream_id = %recorded.stream_id,
            event_type = %recorded.event_type,
            "event recorded"
        );
        Ok(recorded)
    }

    pub fn recorded_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub recorder: Arc<EventRecorder>,
    pub gate: AuthorizationGate,
    /// Read side for replay; writes go through the recorder.
    pub store: Arc<dyn EventStore>,
}
