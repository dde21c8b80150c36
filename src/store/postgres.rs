// PostgreSQL implementation of the event log.
//
// Purpose
// - Durable backend for production. One `event_log` table, self-provisioned
//   on `init` and after `reset`.
//
// Responsibilities
// - Assign sequence numbers atomically with the write: the insert returns the
//   BIGSERIAL value the backend chose, so two racing appends can never see
//   the same number. Gaps left by rolled-back backend transactions are the
//   backend's business, not ours.
// - Own the connection pool as an explicit handle bound to init/shutdown,
//   never as ambient state.

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::RwLock;

use crate::config::ConfigurationError;
use crate::store::EventStore;
use crate::store::EventStoreError;
use crate::store::contract::validate;
use crate::store::event::{NewEvent, RecordedEvent};

const CREATE_EVENT_LOG: &str = r#"
CREATE TABLE IF NOT EXISTS event_log (
    sequence_num BIGSERIAL PRIMARY KEY,
    stream_id    TEXT NOT NULL,
    event_type   TEXT NOT NULL,
    data         JSONB NOT NULL,
    meta         JSONB NOT NULL,
    log_date     TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

// Replay consumers filter by stream; plain index, deliberately no uniqueness
// or version constraint per stream.
const CREATE_STREAM_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_event_log_stream_id ON event_log(stream_id)
"#;

#[derive(sqlx::FromRow)]
struct EventRow {
    sequence_num: i64,
    stream_id: String,
    event_type: String,
    data: serde_json::Value,
    meta: serde_json::Value,
    log_date: DateTime<Utc>,
}

impl From<EventRow> for RecordedEvent {
    fn from(row: EventRow) -> Self {
        Self {
            sequence_num: row.sequence_num,
            stream_id: row.stream_id,
            event_type: row.event_type,
            data: row.data,
            meta: row.meta,
            log_date: row.log_date,
        }
    }
}

pub struct PostgresEventStore {
    connection_string: String,
    pool: RwLock<Option<PgPool>>,
}

impl PostgresEventStore {
    /// Fails before any network activity when the connection target is empty.
    pub fn new(connection_string: impl Into<String>) -> Result<Self, ConfigurationError> {
        let connection_string = connection_string.into();
        if connection_string.is_empty() {
            return Err(ConfigurationError::MissingConnectionString);
        }
        Ok(Self {
            connection_string,
            pool: RwLock::new(None),
        })
    }

    async fn pool(&self) -> Result<PgPool, EventStoreError> {
        self.pool
            .read()
            .await
            .clone()
            .ok_or_else(|| EventStoreError::Connection("event store not initialized".into()))
    }

    async fn ensure_schema(pool: &PgPool) -> Result<(), EventStoreError> {
        sqlx::query(CREATE_EVENT_LOG)
            .execute(pool)
            .await
            .map_err(|e| EventStoreError::Schema(e.to_string()))?;
        sqlx::query(CREATE_STREAM_INDEX)
            .execute(pool)
            .await
            .map_err(|e| EventStoreError::Schema(e.to_string()))?;
        Ok(())
    }
}

fn map_backend_error(operation: &'static str, err: sqlx::Error) -> EventStoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("42P01") => {
            EventStoreError::Schema(db.message().to_string())
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => EventStoreError::Connection(err.to_string()),
        _ => EventStoreError::query(operation, err.to_string()),
    }
}

#[async_trait::async_trait]
impl EventStore for PostgresEventStore {
    async fn init(&self) -> Result<(), EventStoreError> {
        let mut guard = self.pool.write().await;
        if guard.is_some() {
            return Ok(());
        }
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&self.connection_string)
            .await
            .map_err(|e| EventStoreError::Connection(e.to_string()))?;
        if let Err(err) = Self::ensure_schema(&pool).await {
            pool.close().await;
            return Err(err);
        }
        *guard = Some(pool);
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), EventStoreError> {
        if let Some(pool) = self.pool.write().await.take() {
            pool.close().await;
        }
        Ok(())
    }

    async fn add_event(&self, event: NewEvent) -> Result<RecordedEvent, EventStoreError> {
        validate(&event)?;
        let pool = self.pool().await?;
        let row: EventRow = sqlx::query_as(
            r#"
            INSERT INTO event_log (stream_id, event_type, data, meta)
            VALUES ($1, $2, $3, $4)
            RETURNING sequence_num, stream_id, event_type, data, meta, log_date
            "#,
        )
        .bind(&event.stream_id)
        .bind(&event.event_type)
        .bind(&event.data)
        .bind(&event.meta)
        .fetch_one(&pool)
        .await
        .map_err(|e| map_backend_error("add_event", e))?;
        Ok(row.into())
    }

    async fn get_all_events_in_order(&self) -> Result<Vec<RecordedEvent>, EventStoreError> {
        let pool = self.pool().await?;
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT sequence_num, stream_id, event_type, data, meta, log_date
            FROM event_log
            ORDER BY sequence_num ASC
            "#,
        )
        .fetch_all(&pool)
        .await
        .map_err(|e| map_backend_error("get_all_events_in_order", e))?;
        Ok(rows.into_iter().map(RecordedEvent::from).collect())
    }

    async fn reset(&self) -> Result<(), EventStoreError> {
        let pool = self.pool().await?;
        sqlx::query("DROP TABLE IF EXISTS event_log")
            .execute(&pool)
            .await
            .map_err(|e| map_backend_error("reset", e))?;
        Self::ensure_schema(&pool).await
    }
}
