//! Application state container shared across Axum route handlers and services.
//!
//! Holds the database connection and the broadcast hub. It is cloned freely
//! and passed into route handlers via Axum's `State<T>` extractor.

use crate::ws::BroadcastHub;
use sea_orm::DatabaseConnection;

/// Central application state shared across the server.
///
/// This includes:
/// - A cloned, thread-safe database connection for use with SeaORM.
/// - A global `BroadcastHub` for pushing refresh notices to dashboard observers.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    ws: BroadcastHub,
}

impl AppState {
    /// Creates a new `AppState` with the given database connection and hub.
    pub fn new(db: DatabaseConnection, ws: BroadcastHub) -> Self {
        Self { db, ws }
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Returns a shared reference to the internal `BroadcastHub`.
    pub fn ws(&self) -> &BroadcastHub {
        &self.ws
    }

    /// Returns a cloned copy of the database connection.
    ///
    /// Useful for async contexts or spawning tasks that require ownership.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }

    /// Returns a cloned instance of the `BroadcastHub`.
    pub fn ws_clone(&self) -> BroadcastHub {
        self.ws.clone()
    }
}
