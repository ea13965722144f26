use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::state::SharedState;

/// Simple health-check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub height: u64,
}

/// `GET /health`
///
/// Returns liveness plus the current chain height.
pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    use ledger::BlockStore;

    let height = state.store.lock().await.top_height().unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            height,
        }),
    )
}
