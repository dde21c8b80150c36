// HTTP surface of the pipeline.
//
// Responsibilities
// - The authorization middleware that gates mutation-capable routes: the
//   gate's denial short-circuits the request before the handler, and
//   therefore before the recorder, can run.
// - Generic handlers over the log: record an event from a request body,
//   replay the full log in order.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::{AuthDecision, RequestContext};
use crate::shell::state::AppState;
use crate::store::event::NewEvent;

pub async fn require_authorization(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let context = RequestContext::from_request(&request);
    match state.gate.evaluate(&context).await {
        AuthDecision::Allow => next.run(request).await,
        AuthDecision::Deny => {
            tracing::debug!(method = %context.method, path = %context.path, "request denied");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "authorization denied" })),
            )
                .into_response()
        }
    }
}

/// `POST` handler: the body is the unpersisted event shape; the response is
/// the persisted form with its assigned sequence number.
pub async fn record_event(
    State(state): State<AppState>,
    body: Result<Json<NewEvent>, JsonRejection>,
) -> impl IntoResponse {
    let Json(event) = match body {
        Ok(b) => b,
        Err(_) => return StatusCode::UNPROCESSABLE_ENTITY.into_response(),
    };
    if event.stream_id.is_empty() || event.event_type.is_empty() {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    }

    match state.recorder.record_event(event).await {
        Ok(recorded) => (StatusCode::CREATED, Json(recorded)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "recording failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET` handler: the full log, ordered by ascending sequence number.
pub async fn list_events(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.get_all_events_in_order().await {
        Ok(events) => Json(events).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "replay failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}
