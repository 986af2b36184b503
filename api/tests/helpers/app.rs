use api::{routes::routes, ws::ws_routes};
use axum::{Router, body::Body, http::Request, response::Response};
use std::convert::Infallible;
use std::sync::Once;
use tower::ServiceExt;
use tower::util::BoxCloneService;
use util::state::AppState;
use util::ws::BroadcastHub;

static ENV_INIT: Once = Once::new();

/// Seeds the environment the config singleton reads from. Runs once per test
/// binary, before the first `AppConfig` access.
fn init_test_env() {
    ENV_INIT.call_once(|| {
        // set_var is unsafe in edition 2024; this runs before any config read
        unsafe {
            std::env::set_var("DATABASE_PATH", "sqlite::memory:");
            std::env::set_var("JWT_SECRET", "test_jwt_secret");
            std::env::set_var("JWT_DURATION_MINUTES", "60");
        }
    });
}

/// Builds the full router over a fresh in-memory database.
///
/// Returns the boxed service plus the state so tests can seed data and
/// subscribe to the broadcast hub directly.
pub async fn make_test_app() -> (
    BoxCloneService<Request<Body>, Response, Infallible>,
    AppState,
) {
    init_test_env();

    let db = db::test_utils::setup_test_db().await;
    let state = AppState::new(db, BroadcastHub::new());

    let router = Router::new()
        .nest("/api", routes(state.clone()))
        .nest("/ws", ws_routes(state.clone()));

    (router.into_service().boxed_clone(), state)
}

/// Bearer header value for a freshly minted token.
pub fn auth_header(user_id: i64, supervisor: bool) -> String {
    init_test_env();
    let (token, _) = api::auth::generate_jwt(user_id, supervisor);
    format!("Bearer {token}")
}
