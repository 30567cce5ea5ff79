//! Sale handlers: the cash checkout flow plus ledger reads.
//!
//! POST /api/sales is the direct path: the cart is validated at the
//! boundary and handed to the checkout engine, which commits everything
//! in one transaction. The UPI path reaches the same engine through
//! `/api/upi-payments/{id}/finalise`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;
use volt_core::CartDraft;
use volt_db::SaleDetail;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sales", get(list).post(create))
        .route("/api/sales/{id}", get(get_by_id))
}

#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    #[serde(flatten)]
    pub cart: CartDraft,
    /// Optional replay-protection key; resubmitting with the same key
    /// returns the original sale instead of selling twice.
    pub idempotency_key: Option<String>,
}

/// GET /api/sales - full ledger with resolved items, newest first
async fn list(State(state): State<AppState>) -> Result<Json<Vec<SaleDetail>>, ApiError> {
    let sales = state.db.sales().list().await?;
    Ok(Json(sales))
}

/// GET /api/sales/{id}
async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SaleDetail>, ApiError> {
    let sale = state
        .db
        .sales()
        .get_detail(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", &id))?;
    Ok(Json(sale))
}

/// POST /api/sales - the cash checkout
async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleDetail>), ApiError> {
    let cart = req.cart.into_cart()?;

    let detail = state
        .db
        .checkout()
        .create_sale(&cart, req.idempotency_key.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(detail)))
}
