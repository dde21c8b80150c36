// Composition root for the event log pipeline.
//
// Responsibilities
// - Bind route handlers, wrapping mutation-capable routes with the
//   authorization gate.
// - Own the store lifecycle: init during startup (before the listener ever
//   binds), shutdown on the way out. An optional secondary store for
//   sensitive data shares the same lifecycle hooks and nothing else.
// - Expose the recorder as the single write path handlers use.

pub mod http;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::MethodRouter;
use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use crate::auth::AuthorizationGate;
use crate::config::Config;
use crate::shell::state::{AppState, EventRecorder};
use crate::store::{EventStore, EventStoreError};

pub struct Stack {
    config: Config,
    state: AppState,
    store: Arc<dyn EventStore>,
    sensitive_store: Option<Arc<dyn EventStore>>,
    router: Router<AppState>,
}

impl Stack {
    pub fn new(config: Config, store: Arc<dyn EventStore>, gate: AuthorizationGate) -> Self {
        let state = AppState {
            recorder: Arc::new(EventRecorder::new(store.clone())),
            gate,
            store: store.clone(),
        };
        Self {
            config,
            state,
            store,
            sensitive_store: None,
            router: Router::new(),
        }
    }

    /// Attach the secondary store for sensitive data. It is initialized and
    /// shut down with the stack; nothing in the pipeline writes to it.
    pub fn with_sensitive_store(mut self, store: Arc<dyn EventStore>) -> Self {
        self.sensitive_store = Some(store);
        self
    }

    /// Mount a handler. With `requires_auth` set and authorization enforced,
    /// the gate runs before the handler and a denial ends the request with a
    /// 401 before any event can be recorded.
    pub fn route(
        mut self,
        path: &str,
        handler: MethodRouter<AppState>,
        requires_auth: bool,
    ) -> Self {
        let handler = if requires_auth && self.config.enforce_authorization {
            handler.layer(middleware::from_fn_with_state(
                self.state.clone(),
                http::require_authorization,
            ))
        } else {
            handler
        };
        self.router = self.router.route(path, handler);
        self
    }

    pub fn recorder(&self) -> Arc<EventRecorder> {
        self.state.recorder.clone()
    }

    pub async fn init(&self) -> Result<(), EventStoreError> {
        self.store.init().await?;
        if let Some(store) = &self.sensitive_store {
            store.init().await?;
        }
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<(), EventStoreError> {
        self.store.shutdown().await?;
        if let Some(store) = &self.sensitive_store {
            store.shutdown().await?;
        }
        Ok(())
    }

    /// The composed router, ready to serve. Used directly by the test
    /// harness; `serve` uses it too, so both run the identical pipeline.
    pub fn into_router(self) -> Router {
        self.router
            .layer(TraceLayer::new_for_http())
            .with_state(self.state)
    }

    /// Initialize the stores, then accept requests until ctrl-c. The stores
    /// must be up before the listener binds; a failing init is fatal.
    pub async fn serve(self) -> anyhow::Result<()> {
        self.init().await?;
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.server_port));
        let store = self.store.clone();
        let sensitive_store = self.sensitive_store.clone();
        let router = self.into_router();

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "event log listening");
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await?;

        store.shutdown().await?;
        if let Some(store) = sensitive_store {
            store.shutdown().await?;
        }
        Ok(())
    }
}
