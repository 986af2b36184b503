//! `/api/dashboard` route group, supervisor-gated at the router level.

pub mod get;

use axum::{Router, routing::get};
use util::state::AppState;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/today", get(get::dashboard_today))
}
