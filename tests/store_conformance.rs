// One contract, two backends: every check in this file runs against the
// in-memory store on every test run, and against PostgreSQL when a database
// is available (ignored by default, enabled via the test-integration script
// with DATABASE_URL set).

use serde_json::json;

use eventlog::store::EventStore;
use eventlog::store::event::NewEvent;
use eventlog::store::in_memory::InMemoryEventStore;
use eventlog::store::postgres::PostgresEventStore;

fn event(stream_id: &str, event_type: &str, data: serde_json::Value) -> NewEvent {
    NewEvent::new(stream_id, event_type, data, json!({}))
}

/// Appends across two streams and expects one totally ordered log back.
async fn check_global_ordering(store: &dyn EventStore) {
    store.reset().await.expect("reset failed");
    for (stream, kind) in [
        ("order-1", "OrderCreated"),
        ("order-2", "OrderCreated"),
        ("order-1", "OrderShipped"),
    ] {
        store
            .add_event(event(stream, kind, json!({})))
            .await
            .expect("append failed");
    }

    let all = store
        .get_all_events_in_order()
        .await
        .expect("replay failed");
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].sequence_num < w[1].sequence_num));
    assert_eq!(all[0].stream_id, "order-1");
    assert_eq!(all[1].stream_id, "order-2");
    assert_eq!(all[2].event_type, "OrderShipped");
}

async fn check_round_trip_fidelity(store: &dyn EventStore) {
    store.reset().await.expect("reset failed");
    let data = json!({ "amount": 10, "lines": [{ "sku": "a" }, { "sku": "b" }], "note": null });
    let meta = json!({ "causation": "cmd-7", "actor": { "id": "u-1" } });
    let recorded = store
        .add_event(NewEvent::new("order-1", "OrderCreated", data.clone(), meta.clone()))
        .await
        .expect("append failed");
    assert_eq!(recorded.data, data);
    assert_eq!(recorded.meta, meta);

    let all = store
        .get_all_events_in_order()
        .await
        .expect("replay failed");
    assert_eq!(all[0].data, data);
    assert_eq!(all[0].meta, meta);
}

async fn check_reset_idempotence(store: &dyn EventStore) {
    store
        .add_event(event("order-1", "OrderCreated", json!({})))
        .await
        .expect("append failed");
    store.reset().await.expect("reset failed");
    assert!(
        store
            .get_all_events_in_order()
            .await
            .expect("replay failed")
            .is_empty()
    );
    store.reset().await.expect("second reset failed");
    assert!(
        store
            .get_all_events_in_order()
            .await
            .expect("replay failed")
            .is_empty()
    );

    // the log keeps working after a reset, with increasing numbering
    let first = store
        .add_event(event("order-1", "OrderCreated", json!({})))
        .await
        .expect("append failed");
    let second = store
        .add_event(event("order-1", "OrderShipped", json!({})))
        .await
        .expect("append failed");
    assert!(first.sequence_num < second.sequence_num);
}

async fn check_rejects_empty_fields(store: &dyn EventStore) {
    store.reset().await.expect("reset failed");
    assert!(store.add_event(event("", "OrderCreated", json!({}))).await.is_err());
    assert!(store.add_event(event("order-1", "", json!({}))).await.is_err());
    assert!(
        store
            .get_all_events_in_order()
            .await
            .expect("replay failed")
            .is_empty()
    );
}

async fn run_contract_suite(store: &dyn EventStore) {
    check_global_ordering(store).await;
    check_round_trip_fidelity(store).await;
    check_reset_idempotence(store).await;
    check_rejects_empty_fields(store).await;
}

#[tokio::test]
async fn in_memory_store_satisfies_the_contract() {
    let store = InMemoryEventStore::new();
    store.init().await.expect("init failed");
    run_contract_suite(&store).await;
    store.shutdown().await.expect("shutdown failed");
}

#[tokio::test]
#[ignore = "integration: requires a reachable DATABASE_URL"]
async fn integration_postgres_store_satisfies_the_contract() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let store = PostgresEventStore::new(url).expect("connection string rejected");
    store.init().await.expect("init failed");
    run_contract_suite(&store).await;
    store.shutdown().await.expect("shutdown failed");
}

#[tokio::test]
#[ignore = "integration: requires a reachable DATABASE_URL"]
async fn integration_postgres_init_is_idempotent() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let store = PostgresEventStore::new(url).expect("connection string rejected");
    store.init().await.expect("first init failed");
    store.init().await.expect("second init failed");
    store.shutdown().await.expect("shutdown failed");
}
