use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use services::SessionManager;
use util::{state::AppState, ws::dashboard_topic};

use crate::response::ApiResponse;

use super::super::common::{SessionResponse, error_status};

/// PUT /api/sessions/{session_id}/finalize
///
/// Closes the session. Finalizing an already-closed session is reported as
/// an error rather than silently succeeding.
pub async fn finalize_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<SessionResponse>>) {
    let db = state.db();

    match SessionManager::close_session(db, session_id).await {
        Ok(session) => {
            state.ws().notify_refresh(&dashboard_topic()).await;
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    SessionResponse::from(session),
                    "Session finalized",
                )),
            )
        }
        Err(e) => (error_status(&e), Json(ApiResponse::error(e.to_string()))),
    }
}
