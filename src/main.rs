use std::sync::Arc;

use async_trait::async_trait;
use axum::routing::{get, post};
use tracing_subscriber::{EnvFilter, fmt};

use eventlog::auth::{ApiAuthorizer, AuthorizationGate, RequestContext};
use eventlog::config::Config;
use eventlog::shell::Stack;
use eventlog::shell::http;
use eventlog::store::postgres::PostgresEventStore;

/// Minimal checker for the binary: the request must carry the configured
/// bearer token. Anything smarter gets injected the same way.
struct BearerToken {
    expected: String,
}

impl BearerToken {
    fn new(token: String) -> Self {
        Self {
            expected: format!("Bearer {token}"),
        }
    }
}

#[async_trait]
impl ApiAuthorizer for BearerToken {
    async fn authorize(&self, context: &RequestContext) -> bool {
        context.authorization.as_deref() == Some(self.expected.as_str())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::from_env()?;
    let store = Arc::new(PostgresEventStore::new(config.connection_string.clone())?);

    let gate = match std::env::var("API_TOKEN") {
        Ok(token) if !token.is_empty() => AuthorizationGate::api(BearerToken::new(token)),
        _ => {
            tracing::warn!("API_TOKEN not set; requests are not authorized");
            AuthorizationGate::no_authorization()
        }
    };

    Stack::new(config, store, gate)
        .route(
            "/events",
            post(http::record_event).get(http::list_events),
            true,
        )
        .route("/health", get(http::health), false)
        .serve()
        .await
}
