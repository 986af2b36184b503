use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use services::AttendanceRecorder;
use util::{state::AppState, ws::dashboard_topic};

use crate::response::ApiResponse;

use super::super::common::{AttendanceRecordResponse, ObservationsReq, error_status};

/// PUT /api/attendance/records/{record_id}/exit
///
/// Check-out on an existing record. Rejected before any entry, and again
/// once entry and exit are both recorded.
pub async fn record_exit(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<AttendanceRecordResponse>>) {
    let db = state.db();

    match AttendanceRecorder::record_exit(db, record_id).await {
        Ok(record) => {
            state.ws().notify_refresh(&dashboard_topic()).await;
            (
                StatusCode::OK,
                Json(ApiResponse::success(record.into(), "Exit recorded")),
            )
        }
        Err(e) => (error_status(&e), Json(ApiResponse::error(e.to_string()))),
    }
}

/// PUT /api/attendance/records/{record_id}/observations
///
/// Replaces the observation text on a record, addressed by id. Allowed on a
/// complete record.
pub async fn edit_observations(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
    Json(body): Json<ObservationsReq>,
) -> (StatusCode, Json<ApiResponse<AttendanceRecordResponse>>) {
    let db = state.db();

    match AttendanceRecorder::set_observations_by_record(db, record_id, &body.text).await {
        Ok(record) => {
            state.ws().notify_refresh(&dashboard_topic()).await;
            (
                StatusCode::OK,
                Json(ApiResponse::success(record.into(), "Observations saved")),
            )
        }
        Err(e) => (error_status(&e), Json(ApiResponse::error(e.to_string()))),
    }
}
