//! # API Routes
//!
//! One module per resource; each exposes a `router()` merged here.

mod exchanges;
mod health;
mod payments;
mod products;
mod sales;
mod services;

use axum::Router;

use crate::state::AppState;

/// Builds the full API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(products::router())
        .merge(services::router())
        .merge(exchanges::router())
        .merge(sales::router())
        .merge(payments::router())
}
