//! WebSocket entry point for `/ws/...`.
//!
//! The token travels as a query parameter because browser WebSocket clients
//! cannot set an `Authorization` header; each handler validates it before
//! accepting the upgrade.

pub mod dashboard;

use axum::{Router, routing::get};
use util::state::AppState;

use dashboard::dashboard_ws_handler;

pub fn ws_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard_ws_handler))
        .with_state(app_state)
}
