//! Axum router construction.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS enabled for the browser client.

use std::sync::Arc;

use axum::Router;
use axum::http::{Method, header};
use axum::routing::{get, post};
use clicker_db::StateStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- current game state
/// - `POST /produce` -- produce one resource
/// - `POST /convert` -- convert one resource into currency
/// - `GET /ws` -- `WebSocket` observer channel
///
/// CORS allows any origin with `GET`, `POST` and `OPTIONS` and the
/// `Content-Type` header.
pub fn build_router<S: StateStore>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(handlers::get_state::<S>))
        .route("/produce", post(handlers::produce::<S>))
        .route("/convert", post(handlers::convert::<S>))
        .route("/ws", get(ws::ws_channel::<S>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
