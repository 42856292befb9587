//! Saved-candidate roster API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, respond, success, ApiResult};
use crate::models::{CandidateDetail, RosterDisplay, SetQueryRequest, ToggleSortRequest};
use crate::search::RosterView;
use crate::AppState;

fn render(view: &RosterView, roster: &[CandidateDetail], state: &AppState) -> RosterDisplay {
    let candidates = view.display(roster);
    let notice = state.roster.take_notice();
    RosterDisplay {
        matched: candidates.len(),
        candidates,
        query: view.query().to_string(),
        sort_field: view.sort_field(),
        ascending: view.ascending(),
        total: roster.len(),
        notice,
        notice_message: notice.map(|kind| kind.message().to_string()),
    }
}

/// Load the roster and render it with the current view settings.
async fn display(state: &AppState) -> ApiResult<RosterDisplay> {
    match state.roster.load().await {
        Ok(loaded) => {
            let view = state.view.lock().await;
            success(render(&view, &loaded.candidates, state), loaded.revision)
        }
        Err(e) => error(e, 0),
    }
}

/// GET /api/roster - Filtered and sorted saved candidates.
pub async fn get_roster(State(state): State<AppState>) -> ApiResult<RosterDisplay> {
    display(&state).await
}

/// PUT /api/roster/query - Set the free-text filter.
pub async fn set_query(
    State(state): State<AppState>,
    Json(request): Json<SetQueryRequest>,
) -> ApiResult<RosterDisplay> {
    state.view.lock().await.set_query(request.query);
    display(&state).await
}

/// POST /api/roster/sort - Sort by a column, flipping direction on repeat.
pub async fn toggle_sort(
    State(state): State<AppState>,
    Json(request): Json<ToggleSortRequest>,
) -> ApiResult<RosterDisplay> {
    state.view.lock().await.toggle_sort(request.field);
    display(&state).await
}

/// DELETE /api/roster/sort - Return to insertion order.
pub async fn clear_sort(State(state): State<AppState>) -> ApiResult<RosterDisplay> {
    state.view.lock().await.clear_sort();
    display(&state).await
}

/// DELETE /api/roster/candidates/:login - Remove a saved candidate.
pub async fn remove_candidate(
    State(state): State<AppState>,
    Path(login): Path<String>,
) -> ApiResult<RosterDisplay> {
    match state.roster.remove(&login).await {
        Ok(remaining) => {
            tracing::debug!(
                "Roster has {} candidates after removing {}",
                remaining.candidates.len(),
                login
            );
            let view = state.view.lock().await;
            success(render(&view, &remaining.candidates, &state), remaining.revision)
        }
        Err(e) => respond(&state.roster, Err(e)).await,
    }
}
