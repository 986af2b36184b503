use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use services::AttendanceRecorder;
use util::state::AppState;

use crate::response::ApiResponse;

use super::super::common::{AttendanceRecordResponse, error_status};

/// GET /api/sessions/{session_id}/records
///
/// All attendance records of the session, for the instructor's live view.
pub async fn session_records(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Vec<AttendanceRecordResponse>>>) {
    let db = state.db();

    match AttendanceRecorder::records_for_session(db, session_id).await {
        Ok(records) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                records.into_iter().map(Into::into).collect(),
                "Session records fetched",
            )),
        ),
        Err(e) => (error_status(&e), Json(ApiResponse::error(e.to_string()))),
    }
}
