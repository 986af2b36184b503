use axum::{Extension, Json, extract::State, http::StatusCode};
use services::SessionManager;
use util::{state::AppState, ws::dashboard_topic};

use crate::{auth::AuthUser, response::ApiResponse};

use super::super::common::{EnterSessionReq, SessionResponse, error_status};

/// POST /api/sessions/enter
///
/// Returns the roster's open session for today, creating one if absent.
/// Calling it again before finalize returns the same session, including when
/// a different assigned instructor entered first.
pub async fn enter_session(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<EnterSessionReq>,
) -> (StatusCode, Json<ApiResponse<SessionResponse>>) {
    let db = state.db();

    match SessionManager::ensure_session(db, claims.sub, body.roster_id).await {
        Ok(session) => {
            state.ws().notify_refresh(&dashboard_topic()).await;
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    SessionResponse::from(session),
                    "Session is open",
                )),
            )
        }
        Err(e) => (error_status(&e), Json(ApiResponse::error(e.to_string()))),
    }
}
