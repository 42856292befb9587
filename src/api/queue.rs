//! Review queue API endpoints.

use axum::{extract::State, Json};

use super::{respond, ApiResult};
use crate::errors::AppError;
use crate::models::{CandidateDetail, QueueSnapshot};
use crate::AppState;

/// GET /api/queue - Current queue state.
pub async fn get_queue(State(state): State<AppState>) -> ApiResult<QueueSnapshot> {
    let snapshot = state.queue.snapshot().await;
    respond(&state.roster, Ok(snapshot)).await
}

/// POST /api/queue/initialize - Fetch a fresh batch.
///
/// Directory failures are reported in the snapshot's `error` field.
pub async fn initialize_queue(State(state): State<AppState>) -> ApiResult<QueueSnapshot> {
    let transition = state.queue.initialize().await;
    respond(&state.roster, Ok(transition.snapshot)).await
}

/// POST /api/queue/accept - Save the focused candidate and advance.
pub async fn accept_candidate(
    State(state): State<AppState>,
    Json(candidate): Json<CandidateDetail>,
) -> ApiResult<QueueSnapshot> {
    let result = if candidate.login.trim().is_empty() {
        Err(AppError::Validation(
            "Candidate login is required".to_string(),
        ))
    } else {
        state
            .queue
            .accept(&candidate)
            .await
            .map(|transition| transition.snapshot)
    };

    respond(&state.roster, result).await
}

/// POST /api/queue/reject - Skip the focused candidate.
pub async fn reject_candidate(State(state): State<AppState>) -> ApiResult<QueueSnapshot> {
    let result = state
        .queue
        .reject()
        .await
        .map(|transition| transition.snapshot);
    respond(&state.roster, result).await
}
