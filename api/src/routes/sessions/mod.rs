//! `/api/sessions` route group: session lifecycle endpoints.

pub mod get;
pub mod post;
pub mod put;

use axum::{
    Router,
    routing::{get, post, put},
};
use util::state::AppState;

pub fn sessions_routes() -> Router<AppState> {
    Router::new()
        .route("/enter", post(post::enter_session))
        .route("/{session_id}/finalize", put(put::finalize_session))
        .route("/{session_id}/records", get(get::session_records))
}
