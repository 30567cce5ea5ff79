//! Shared application state for axum handlers.

use volt_db::Database;

/// State cloned into every handler.
///
/// `Database` is itself a cheap clone around the connection pool, so no
/// extra Arc is needed.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }
}
