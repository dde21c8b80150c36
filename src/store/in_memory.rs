// In memory implementation of the event log.
//
// Purpose
// - Support pipeline tests and local development without a database.
//
// Responsibilities
// - Keep the log in an ordered Vec and hand out sequence numbers from a
//   counter that survives resets, so numbering stays strictly increasing for
//   the lifetime of the process.
// - Offer the same failure-injection knobs tests rely on elsewhere in the
//   codebase: an offline toggle and a configurable append delay that widens
//   the race window between interleaved writers.

use chrono::Utc;
use tokio::sync::Mutex;

use crate::store::EventStore;
use crate::store::EventStoreError;
use crate::store::contract::validate;
use crate::store::event::{NewEvent, RecordedEvent};

#[derive(Default)]
struct Log {
    events: Vec<RecordedEvent>,
    next_sequence: i64,
}

pub struct InMemoryEventStore {
    log: Mutex<Log>,
    offline: bool,
    delay_add_ms: u64,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self {
            log: Mutex::new(Log {
                events: Vec::new(),
                next_sequence: 1,
            }),
            offline: false,
            delay_add_ms: 0,
        }
    }

    /// Make every operation fail with a connection error. Call before the
    /// store is shared.
    pub fn toggle_offline(&mut self) {
        self.offline = !self.offline;
    }

    /// Delay each append before it takes the log lock. Call before the store
    /// is shared.
    pub fn set_delay_add_ms(&mut self, ms: u64) {
        self.delay_add_ms = ms;
    }

    fn check_online(&self) -> Result<(), EventStoreError> {
        if self.offline {
            return Err(EventStoreError::Connection("event store offline".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EventStore for InMemoryEventStore {
    async fn init(&self) -> Result<(), EventStoreError> {
        self.check_online()
    }

    async fn shutdown(&self) -> Result<(), EventStoreError> {
        Ok(())
    }

    async fn add_event(&self, event: NewEvent) -> Result<RecordedEvent, EventStoreError> {
        self.check_online()?;
        validate(&event)?;
        if self.delay_add_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_add_ms)).await;
        }
        let mut log = self.log.lock().await;
        let recorded = RecordedEvent {
            sequence_num: log.next_sequence,
            stream_id: event.stream_id,
            event_type: event.event_type,
            data: event.data,
            meta: event.meta,
            log_date: Utc::now(),
        };
        log.next_sequence += 1;
        log.events.push(recorded.clone());
        Ok(recorded)
    }

    async fn get_all_events_in_order(&self) -> Result<Vec<RecordedEvent>, EventStoreError> {
        self.check_online()?;
        Ok(self.log.lock().await.events.clone())
    }

    async fn reset(&self) -> Result<(), EventStoreError> {
        self.check_online()?;
        self.log.lock().await.events.clear();
        Ok(())
    }
}

#[cfg(test)]
mod in_memory_event_store_tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use tokio::join;

    fn order_created() -> NewEvent {
        NewEvent::new("order-1", "OrderCreated", json!({ "amount": 10 }), json!({}))
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_assign_strictly_increasing_sequence_numbers() {
        let store = InMemoryEventStore::new();
        let first = store.add_event(order_created()).await.unwrap();
        let second = store
            .add_event(NewEvent::new("order-1", "OrderShipped", json!({}), json!({})))
            .await
            .unwrap();
        assert!(first.sequence_num < second.sequence_num);

        let all = store.get_all_events_in_order().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].event_type, "OrderCreated");
        assert_eq!(all[1].event_type, "OrderShipped");
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_round_trip_data_and_meta_payloads() {
        let store = InMemoryEventStore::new();
        let data = json!({ "nested": { "values": [1, 2, 3] }, "flag": true });
        let meta = json!({ "causation": "cmd-42", "actor": null });
        store
            .add_event(NewEvent::new("s-1", "Noted", data.clone(), meta.clone()))
            .await
            .unwrap();

        let all = store.get_all_events_in_order().await.unwrap();
        assert_eq!(all[0].data, data);
        assert_eq!(all[0].meta, meta);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_return_an_empty_log_after_reset() {
        let store = InMemoryEventStore::new();
        store.add_event(order_created()).await.unwrap();
        store.reset().await.unwrap();
        assert!(store.get_all_events_in_order().await.unwrap().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_keep_sequence_numbers_increasing_across_a_reset() {
        let store = InMemoryEventStore::new();
        let before = store.add_event(order_created()).await.unwrap();
        store.reset().await.unwrap();
        let after = store.add_event(order_created()).await.unwrap();
        assert!(after.sequence_num > before.sequence_num);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reject_an_event_with_an_empty_stream_id() {
        let store = InMemoryEventStore::new();
        let result = store
            .add_event(NewEvent::new("", "OrderCreated", json!({}), json!({})))
            .await;
        assert!(matches!(
            result,
            Err(EventStoreError::Query {
                operation: "add_event",
                ..
            })
        ));
        assert!(store.get_all_events_in_order().await.unwrap().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_fail_every_operation_when_offline() {
        let mut store = InMemoryEventStore::new();
        store.toggle_offline();
        assert!(matches!(
            store.add_event(order_created()).await,
            Err(EventStoreError::Connection(_))
        ));
        assert!(store.get_all_events_in_order().await.is_err());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_serialize_interleaved_appends() {
        let mut store = InMemoryEventStore::new();
        store.set_delay_add_ms(10);
        let (left, right) = join!(
            store.add_event(NewEvent::new("a", "Left", json!({}), json!({}))),
            store.add_event(NewEvent::new("b", "Right", json!({}), json!({})))
        );
        let left = left.unwrap();
        let right = right.unwrap();
        assert_ne!(left.sequence_num, right.sequence_num);

        let all = store.get_all_events_in_order().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].sequence_num < all[1].sequence_num);
    }
}
