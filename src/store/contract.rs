// The event log port.
//
// Purpose
// - Describe the append-only log as a trait so the shell can run against the
//   in-memory backend in tests and against PostgreSQL in production.
//
// Responsibilities
// - One contract, two implementations. Every backend must keep sequence
//   numbers globally unique and strictly increasing, and must surface every
//   backend failure to the caller. Nothing here retries.

use async_trait::async_trait;
use thiserror::Error;

use crate::store::event::{NewEvent, RecordedEvent};

#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("query failed during {operation}: {message}")]
    Query {
        operation: &'static str,
        message: String,
    },

    #[error("schema error: {0}")]
    Schema(String),
}

impl EventStoreError {
    pub fn query(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Query {
            operation,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Acquire backend resources and make sure the log structure exists.
    /// Idempotent: a second call on an initialized store is a no-op.
    async fn init(&self) -> Result<(), EventStoreError>;

    /// Release backend resources. Safe to call on a store that was never
    /// initialized.
    async fn shutdown(&self) -> Result<(), EventStoreError>;

    /// Persist an event, assigning the next sequence number and a write
    /// timestamp atomically with the write. The log grows by exactly one
    /// entry or the call fails; there is no partial record.
    async fn add_event(&self, event: NewEvent) -> Result<RecordedEvent, EventStoreError>;

    /// A complete snapshot of the log, ordered by ascending sequence number.
    async fn get_all_events_in_order(&self) -> Result<Vec<RecordedEvent>, EventStoreError>;

    /// Drop and recreate the log structure. Testing and bootstrapping only.
    /// Afterwards the log reads empty; sequence numbers keep increasing from
    /// wherever the backend resumes.
    async fn reset(&self) -> Result<(), EventStoreError>;
}

/// Field checks shared by both backends. An event with an empty stream id or
/// type tag is rejected before it can reach the log.
pub(crate) fn validate(event: &NewEvent) -> Result<(), EventStoreError> {
    if event.stream_id.is_empty() {
        return Err(EventStoreError::query(
            "add_event",
            "stream id must not be empty",
        ));
    }
    if event.event_type.is_empty() {
        return Err(EventStoreError::query(
            "add_event",
            "event type must not be empty",
        ));
    }
    Ok(())
}
