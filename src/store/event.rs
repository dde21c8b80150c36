// The record type flowing through the event log.
//
// Two forms exist: `NewEvent` is what a handler produces (no sequence, no
// timestamp), `RecordedEvent` is what the store hands back once the write is
// durable. A `RecordedEvent` is immutable; there is no update API anywhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An event as produced by application code, before the store has seen it.
///
/// `data` and `meta` are opaque to the store: they are persisted and read
/// back verbatim, never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub stream_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub meta: Value,
}

impl NewEvent {
    pub fn new(
        stream_id: impl Into<String>,
        event_type: impl Into<String>,
        data: Value,
        meta: Value,
    ) -> Self {
        Self {
            stream_id: stream_id.into(),
            event_type: event_type.into(),
            data,
            meta,
        }
    }
}

/// The persisted form: the store has assigned a globally unique, strictly
/// increasing sequence number and a write timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedEvent {
    pub sequence_num: i64,
    pub stream_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
    pub meta: Value,
    pub log_date: DateTime<Utc>,
}
