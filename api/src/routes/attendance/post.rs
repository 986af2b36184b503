use axum::{Json, extract::State, http::StatusCode};
use services::AttendanceRecorder;
use util::{state::AppState, ws::dashboard_topic};

use crate::response::ApiResponse;

use super::super::common::{
    AttendanceRecordResponse, EntryByDocumentReq, RecordEntryReq, ScanResponse,
    UpsertObservationsReq, error_status,
};

/// POST /api/attendance/entry
///
/// Manual check-in for a known learner. A repeated entry is a no-op and
/// still answers 200 with the existing record.
pub async fn record_entry(
    State(state): State<AppState>,
    Json(body): Json<RecordEntryReq>,
) -> (StatusCode, Json<ApiResponse<AttendanceRecordResponse>>) {
    let db = state.db();

    match AttendanceRecorder::record_entry(db, body.session_id, body.learner_id).await {
        Ok(record) => {
            state.ws().notify_refresh(&dashboard_topic()).await;
            (
                StatusCode::OK,
                Json(ApiResponse::success(record.into(), "Entry recorded")),
            )
        }
        Err(e) => (error_status(&e), Json(ApiResponse::error(e.to_string()))),
    }
}

/// POST /api/attendance/entry-by-document
///
/// The scanner endpoint: resolves a document number and applies the
/// entry/exit/already-complete decision. The response carries the decision
/// kind and an inline message for the scanner UI.
pub async fn entry_by_document(
    State(state): State<AppState>,
    Json(body): Json<EntryByDocumentReq>,
) -> (StatusCode, Json<ApiResponse<ScanResponse>>) {
    let db = state.db();

    match AttendanceRecorder::record_by_identifier(db, body.session_id, &body.document_number).await
    {
        Ok(scan) => {
            state.ws().notify_refresh(&dashboard_topic()).await;
            let message = scan.kind.message();
            (
                StatusCode::OK,
                Json(ApiResponse::success(scan.into(), message)),
            )
        }
        Err(e) => (error_status(&e), Json(ApiResponse::error(e.to_string()))),
    }
}

/// POST /api/attendance/observations
///
/// Upserts observation text for (session, learner), creating the record row
/// if the learner has not checked in yet.
pub async fn upsert_observations(
    State(state): State<AppState>,
    Json(body): Json<UpsertObservationsReq>,
) -> (StatusCode, Json<ApiResponse<AttendanceRecordResponse>>) {
    let db = state.db();

    match AttendanceRecorder::set_observations(db, body.session_id, body.learner_id, &body.text)
        .await
    {
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
