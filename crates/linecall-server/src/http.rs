//! HTTP sidecar: health, leaderboard, and the operator room listing.
//!
//! Runs on its own port next to the websocket gateway. Everything here
//! is read-only; game mutations only ever enter through the gateway.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::server::ServerState;

/// Rows returned by the leaderboard endpoint.
const LEADERBOARD_LIMIT: usize = 10;

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/leaderboard", get(leaderboard))
        .route("/api/rooms", get(rooms))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let rooms = state.registry.room_count();
    Json(json!({ "status": "ok", "rooms": rooms }))
}

/// Top scores, descending. A dead store degrades to an empty list
/// rather than an error: the leaderboard is decoration, not truth.
async fn leaderboard(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let entries = match &state.store {
        Some(store) => match store.leaderboard(LEADERBOARD_LIMIT).await {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(%err, "leaderboard read failed");
                Vec::new()
            }
        },
        None => Vec::new(),
    };
    Json(entries)
}

/// Operator-only room listing, guarded by the admin bearer token.
async fn rooms(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorized(&headers, &state.admin_token) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let summaries = state.registry.room_summaries().await;
    Json(summaries).into_response()
}

fn authorized(headers: &HeaderMap, admin_token: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == admin_token)
}
