//! `/api/attendance` route group: check-in, check-out, and observations.

pub mod post;
pub mod put;

use axum::{
    Router,
    routing::{post, put},
};
use util::state::AppState;

pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/entry", post(post::record_entry))
        .route("/entry-by-document", post(post::entry_by_document))
        .route("/observations", post(post::upsert_observations))
        .route("/records/{record_id}/exit", put(put::record_exit))
        .route(
            "/records/{record_id}/observations",
            put(put::edit_observations),
        )
}
