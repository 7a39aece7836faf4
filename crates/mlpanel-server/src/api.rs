//! REST API handlers, the panel-event SSE bridge, and the embedded
//! frontend.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response, Sse},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use mlpanel_core::error::MlpanelError;
use mlpanel_core::models::PanelEvent;

use crate::state::AppState;

// ─── Router ──────────────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/config", get(get_server_config))
        .route("/operators", get(list_operators))
        .route("/operators/placements", get(list_placements))
        .route("/operators/execute/{*uri}", post(execute_operator))
        .route("/operators/input/{*uri}", get(resolve_operator_input))
        .route("/operators/trigger", post(trigger_event))
        .route("/events", get(stream_events))
}

// ─── Handlers ────────────────────────────────────────────────────────────────

async fn get_server_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "dataset": state.store.dataset_name(),
    }))
}

async fn list_operators(State(state): State<AppState>) -> impl IntoResponse {
    let operators: Vec<Value> = state
        .registry
        .iter()
        .map(|(uri, op)| {
            let config = op.config();
            json!({
                "uri": uri,
                "name": config.name,
                "label": config.label,
                "unlisted": config.unlisted,
                "dynamic": config.dynamic,
                "icon": config.icon,
            })
        })
        .collect();
    Json(operators)
}

async fn list_placements(State(state): State<AppState>) -> impl IntoResponse {
    let placements: Vec<Value> = state
        .registry
        .iter()
        .filter_map(|(uri, op)| {
            op.resolve_placement()
                .map(|placement| json!({ "uri": uri, "placement": placement }))
        })
        .collect();
    Json(placements)
}

/// Execute an operator by URI. The body is optional JSON params.
async fn execute_operator(
    State(state): State<AppState>,
    Path(uri): Path<String>,
    body: String,
) -> impl IntoResponse {
    let params = if body.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str(&body) {
            Ok(params) => params,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        }
    };

    let ctx = state.context(params);
    match state.registry.execute(&uri, &ctx) {
        Ok(result) => Json(result).into_response(),
        Err(e @ MlpanelError::UnknownOperator(_)) => {
            (StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
        Err(e @ MlpanelError::InvalidParams(_)) => {
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn resolve_operator_input(
    State(state): State<AppState>,
    Path(uri): Path<String>,
) -> impl IntoResponse {
    let operator = match state.registry.get(&uri) {
        Some(op) => op,
        None => {
            return (StatusCode::NOT_FOUND, format!("Unknown operator: {uri}")).into_response()
        }
    };
    let ctx = state.context(Value::Null);
    match operator.resolve_input(&ctx) {
        Ok(Some(schema)) => Json(schema).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Operator takes no input".to_string()).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Scripted entry point: broadcast a panel event to SSE subscribers.
async fn trigger_event(
    State(state): State<AppState>,
    Json(event): Json<PanelEvent>,
) -> impl IntoResponse {
    state.broadcast(event);
    StatusCode::NO_CONTENT
}

/// SSE endpoint: forwards broadcast panel events to the frontend.
async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|event| {
        let event = event.ok()?;
        let data = serde_json::to_string(&event).ok()?;
        Some(Ok(axum::response::sse::Event::default().data(data)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

// ─── Frontend (embedded) ─────────────────────────────────────────────────────

/// Serve the embedded panel bundle. Paths that match no asset fall back
/// to index.html so the app shell handles them.
pub async fn serve_frontend(uri: axum::http::Uri) -> impl IntoResponse {
    let path = uri.path().trim_start_matches('/');

    let Some((name, asset)) = Assets::get(path)
        .map(|asset| (path, asset))
        .or_else(|| Assets::get("index.html").map(|asset| ("index.html", asset)))
    else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mime = mime_guess::from_path(name).first_or_octet_stream();
    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .body(Body::from(asset.data.into_owned()))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// The panel bundle trunk writes to frontend/dist, plus the mlflow icon.
#[derive(rust_embed::Embed)]
#[folder = "../../frontend/dist"]
#[include = "*.html"]
#[include = "*.js"]
#[include = "*.css"]
#[include = "*.wasm"]
#[include = "*.svg"]
struct Assets;
