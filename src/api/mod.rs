//! REST API module.
//!
//! Queue and roster handlers. Every response carries the roster's current
//! `revisionId` so clients can tell whether their saved list is stale.

mod queue;
mod roster;

pub use queue::*;
pub use roster::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::RosterStore;
use crate::errors::{AppError, AppErrorWithRevision};

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Handler result: the success envelope or an error carrying the revision.
pub type ApiResult<T> = Result<ApiResponse<T>, AppErrorWithRevision>;

/// Wrap `data` in a success envelope at `revision_id`.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse {
        success: true,
        data,
        revision_id,
    })
}

/// Wrap `err` in an error envelope at `revision_id`.
pub fn error<T: Serialize>(err: AppError, revision_id: i64) -> ApiResult<T> {
    Err(AppErrorWithRevision {
        error: err,
        revision_id,
    })
}

/// Envelope for `result`, stamped with the roster revision after the
/// operation ran.
pub async fn respond<T: Serialize>(
    roster: &RosterStore,
    result: Result<T, AppError>,
) -> ApiResult<T> {
    let revision_id = roster.revision().await;
    match result {
        Ok(data) => success(data, revision_id),
        Err(err) => error(err, revision_id),
    }
}
