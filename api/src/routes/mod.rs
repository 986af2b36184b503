//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → liveness check (public)
//! - `/sessions` → session lifecycle (authenticated instructors)
//! - `/attendance` → check-in/check-out and observations (authenticated)
//! - `/dashboard` → presence counts (supervisors only)

use crate::auth::guards::{allow_authenticated, allow_supervisor};
use crate::routes::{
    attendance::attendance_routes, dashboard::dashboard_routes, health::health_routes,
    sessions::sessions_routes,
};
use axum::{Router, middleware::from_fn};
use util::state::AppState;

pub mod attendance;
pub mod common;
pub mod dashboard;
pub mod health;
pub mod sessions;

/// Builds the complete application router for all HTTP endpoints.
///
/// The returned router has `AppState` as its state type and mounts all core
/// API routes under their respective base paths.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest(
            "/sessions",
            sessions_routes()
                .route_layer(from_fn(allow_authenticated))
                .with_state(app_state.clone()),
        )
        .nest(
            "/attendance",
            attendance_routes()
                .route_layer(from_fn(allow_authenticated))
                .with_state(app_state.clone()),
        )
        .nest(
            "/dashboard",
            dashboard_routes()
                .route_layer(from_fn(allow_supervisor))
                .with_state(app_state),
        )
}
