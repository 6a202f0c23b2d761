//! REST endpoints driving the workflow over HTTP.
//!
//! Every mutating call answers with the messages the workflow produced for
//! that request, the resulting state and, on failure, the error kind.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::debug;

use crate::error::FlowError;

use super::manager::BrandFlow;
use super::outbox::{CollectingOutbox, Outbound};
use super::render::{FlowEvent, InboundEvent};
use super::state::StageState;

/// Shared state for the workflow routes.
#[derive(Clone)]
pub struct FlowRouteState {
    pub flow: Arc<BrandFlow>,
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub seed_concept: String,
    pub project_name: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct FlowResponse {
    pub messages: Vec<Outbound>,
    /// `None` once the session is gone.
    pub state: Option<StageState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Build the workflow REST routes.
pub fn flow_routes(flow: Arc<BrandFlow>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sessions/{identity}/start", post(start_session))
        .route("/api/sessions/{identity}/events", post(post_event))
        .route(
            "/api/sessions/{identity}",
            get(get_session).delete(delete_session),
        )
        .layer(CorsLayer::permissive())
        .with_state(FlowRouteState { flow })
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "brand-gen"
    }))
}

/// POST /api/sessions/{identity}/start
async fn start_session(
    State(state): State<FlowRouteState>,
    Path(identity): Path<String>,
    Json(req): Json<StartRequest>,
) -> Response {
    let outbox = CollectingOutbox::new();
    let result = state
        .flow
        .start(&identity, &req.seed_concept, &req.project_name, &outbox)
        .await
        .map(Some);
    respond(&state.flow, &identity, result, outbox.drain().await).await
}

/// POST /api/sessions/{identity}/events
async fn post_event(
    State(state): State<FlowRouteState>,
    Path(identity): Path<String>,
    Json(event): Json<InboundEvent>,
) -> Response {
    let event = match FlowEvent::try_from(event) {
        Ok(event) => event,
        Err(e) => {
            let current = state.flow.status(&identity).await.map(|s| s.state);
            let body = FlowResponse {
                messages: Vec::new(),
                state: current,
                error: Some(ErrorBody {
                    kind: "malformed_event",
                    message: e.to_string(),
                }),
            };
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
        }
    };

    debug!(identity = %identity, event = ?event, "HTTP event");
    let outbox = CollectingOutbox::new();
    let result = state.flow.handle(&identity, event, &outbox).await;
    respond(&state.flow, &identity, result, outbox.drain().await).await
}

/// GET /api/sessions/{identity}
async fn get_session(
    State(state): State<FlowRouteState>,
    Path(identity): Path<String>,
) -> Response {
    match state.flow.status(&identity).await {
        Some(status) => Json(status).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "No session for this identity"})),
        )
            .into_response(),
    }
}

/// DELETE /api/sessions/{identity}
async fn delete_session(
    State(state): State<FlowRouteState>,
    Path(identity): Path<String>,
) -> StatusCode {
    if state.flow.reset(&identity).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn respond(
    flow: &BrandFlow,
    identity: &str,
    result: Result<Option<StageState>, FlowError>,
    messages: Vec<Outbound>,
) -> Response {
    match result {
        Ok(state) => Json(FlowResponse {
            messages,
            state,
            error: None,
        })
        .into_response(),
        Err(err) => {
            let state = flow.status(identity).await.map(|s| s.state);
            let body = FlowResponse {
                messages,
                state,
                error: Some(ErrorBody {
                    kind: err.kind(),
                    message: err.to_string(),
                }),
            };
            (status_for(&err), Json(body)).into_response()
        }
    }
}

/// HTTP status for a workflow error.
fn status_for(err: &FlowError) -> StatusCode {
    if err.is_fatal() {
        return StatusCode::GONE;
    }
    match err {
        FlowError::GenerationFailed { .. } => StatusCode::BAD_GATEWAY,
        FlowError::StateMismatch { .. } => StatusCode::CONFLICT,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}
