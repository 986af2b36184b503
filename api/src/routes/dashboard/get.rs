use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::Serialize;
use services::{DashboardAggregator, DashboardSnapshot, RosterPresence};
use util::state::AppState;

use crate::response::ApiResponse;

use super::super::common::error_status;

/// Serializable mirror of the service snapshot, with a `Default` impl so the
/// error envelope can be built.
#[derive(Debug, Serialize, Default)]
pub struct DashboardResponse {
    pub date: String,
    pub total_present: u64,
    pub per_roster: Vec<RosterPresence>,
}

impl From<DashboardSnapshot> for DashboardResponse {
    fn from(s: DashboardSnapshot) -> Self {
        Self {
            date: s.date.to_string(),
            total_present: s.total_present,
            per_roster: s.per_roster,
        }
    }
}

/// GET /api/dashboard/today
///
/// Presence counts for the current date, grouped per roster. Recomputed on
/// every call; the WebSocket refresh notice tells observers when to pull.
pub async fn dashboard_today(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<DashboardResponse>>) {
    let db = state.db();
    let today = Utc::now().date_naive();

    match DashboardAggregator::today(db, today).await {
        Ok(snapshot) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                snapshot.into(),
                "Dashboard snapshot fetched",
            )),
        ),
        Err(e) => (error_status(&e), Json(ApiResponse::error(e.to_string()))),
    }
}
