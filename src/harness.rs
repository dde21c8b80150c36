// Drop-in pipeline for tests.
//
// Purpose
// - A fully wired stack over the in-memory store, plus conveniences for
//   issuing synthetic requests against the mounted routes.
//
// Boundaries
// - Requests go through the exact router `Stack::serve` would run, gate
//   middleware and recorder included. Only the storage backend differs from
//   production, so pipeline assertions made here carry over.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::auth::AuthorizationGate;
use crate::config::Config;
use crate::shell::Stack;
use crate::shell::state::EventRecorder;
use crate::store::in_memory::InMemoryEventStore;

pub struct HarnessResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub struct TestHarness {
    router: Router,
    store: Arc<InMemoryEventStore>,
    recorder: Arc<EventRecorder>,
}

impl TestHarness {
    /// A stack with authorization switched off. `mount` receives the stack
    /// to register routes, exactly as the binary does.
    pub async fn new(mount: impl FnOnce(Stack) -> Stack) -> Self {
        Self::with_gate(AuthorizationGate::no_authorization(), false, mount).await
    }

    /// A stack with the given gate and enforcement on, for authorization
    /// tests.
    pub async fn with_gate(
        gate: AuthorizationGate,
        enforce_authorization: bool,
        mount: impl FnOnce(Stack) -> Stack,
    ) -> Self {
        let config = Config::new("in-memory", 0, enforce_authorization)
            .expect("harness config is static");
        let store = Arc::new(InMemoryEventStore::new());
        let stack = mount(Stack::new(config, store.clone(), gate));
        stack.init().await.expect("in-memory init cannot fail");
        let recorder = stack.recorder();
        Self {
            router: stack.into_router(),
            store,
            recorder,
        }
    }

    pub fn store(&self) -> Arc<InMemoryEventStore> {
        self.store.clone()
    }

    pub fn recorder(&self) -> Arc<EventRecorder> {
        self.recorder.clone()
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> HarnessResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request construction is static");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body collection cannot fail")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        HarnessResponse { status, body }
    }

    pub async fn get(&self, path: &str) -> HarnessResponse {
        self.send(Method::GET, path, None, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> HarnessResponse {
        self.send(Method::POST, path, None, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> HarnessResponse {
        self.send(Method::PUT, path, None, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> HarnessResponse {
        self.send(Method::DELETE, path, None, None).await
    }
}
