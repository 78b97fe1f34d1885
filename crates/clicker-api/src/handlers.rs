//! REST endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Current `{ currency, resource }` |
//! | `POST` | `/produce` | Add one resource, broadcast, return new state |
//! | `POST` | `/convert` | Spend one resource for one currency, broadcast, return new state |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use clicker_core::Command;
use clicker_db::StateStore;
use clicker_types::GameState;

use crate::error::ApiError;
use crate::state::AppState;

/// Return the current game state.
///
/// # Route
///
/// `GET /`
pub async fn get_state<S: StateStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<GameState>, ApiError> {
    Ok(Json(state.hub.get_state().await?))
}

/// Add one unit of resource.
///
/// # Route
///
/// `POST /produce`
pub async fn produce<S: StateStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<GameState>, ApiError> {
    run_command(&state, Command::Produce).await.map(Json)
}

/// Convert one unit of resource into one unit of currency.
///
/// Answers 400 `{ "message": "insufficient resource" }` when there is
/// nothing to convert.
///
/// # Route
///
/// `POST /convert`
pub async fn convert<S: StateStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<GameState>, ApiError> {
    run_command(&state, Command::Convert).await.map(Json)
}

/// Run `command` on its own task so the commit and broadcast finish even
/// if this request future is dropped.
async fn run_command<S: StateStore>(
    state: &AppState<S>,
    command: Command,
) -> Result<GameState, ApiError> {
    let hub = Arc::clone(&state.hub);
    let snapshot = tokio::spawn(async move { hub.execute(command).await }).await??;
    Ok(snapshot)
}
