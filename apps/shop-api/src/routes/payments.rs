//! UPI deferred-payment handlers.
//!
//! ## Flow
//! ```text
//! Checkout screen picks UPI
//!      │
//!      ▼
//! POST /api/upi-payments              intent created, status=pending
//!      │                              (cart validated and parked here)
//!      ▼
//! GET  /api/upi-payments/{id}/status  client polls every few seconds
//!      │
//!      ▼
//! POST /api/upi-payments/{id}/confirm counter asserts money arrived
//!      │                              status=received
//!      ▼
//! POST /api/upi-payments/{id}/finalise
//!                                     sale created exactly once,
//!                                     status=finalised
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;
use volt_core::validation::validate_amount_paise;
use volt_core::{CartDraft, PaymentIntent, PaymentMethod, PaymentStatus};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/upi-payments", post(create))
        .route("/api/upi-payments/{id}/status", get(status))
        .route("/api/upi-payments/{id}/confirm", post(confirm))
        .route("/api/upi-payments/{id}/finalise", post(finalise))
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub amount_paise: i64,
    /// The cart to replay at finalisation. Validated here, at intent
    /// creation, so a malformed cart never reaches the finalise step.
    pub sale_data: CartDraft,
    /// Opaque invoice-rendering payload, stored and echoed back.
    pub invoice_state: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ConfirmRequest {
    pub upi_ref: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub id: String,
    pub status: PaymentStatus,
}

#[derive(Debug, Serialize)]
pub struct FinaliseResponse {
    pub sale_id: String,
}

/// POST /api/upi-payments - stage a payment, parking the validated cart
async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentIntent>), ApiError> {
    validate_amount_paise("amount", req.amount_paise)?;

    let mut cart = req.sale_data.into_cart()?;
    // Whatever the draft said, this sale will settle over UPI.
    cart.payment_method = PaymentMethod::Upi;

    let intent = state
        .db
        .payments()
        .create(req.amount_paise, &cart, req.invoice_state.as_ref())
        .await?;

    Ok((StatusCode::CREATED, Json(intent)))
}

/// GET /api/upi-payments/{id}/status - poll target
async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let status = state
        .db
        .payments()
        .status(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Payment", &id))?;

    Ok(Json(StatusResponse { id, status }))
}

/// POST /api/upi-payments/{id}/confirm - counter asserts the transfer
/// arrived (pending → received)
async fn confirm(
    State(state): State<AppState>,
    Path(id): Path<String>,
    req: Option<Json<ConfirmRequest>>,
) -> Result<Json<StatusResponse>, ApiError> {
    let upi_ref = req.and_then(|Json(r)| r.upi_ref);

    let status = state.db.payments().confirm(&id, upi_ref.as_deref()).await?;

    Ok(Json(StatusResponse { id, status }))
}

/// POST /api/upi-payments/{id}/finalise - create the sale exactly once
/// (received → finalised)
async fn finalise(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<FinaliseResponse>), ApiError> {
    let detail = state.db.checkout().finalise_payment(&id).await?;

    Ok((
        StatusCode::CREATED,
        Json(FinaliseResponse {
            sale_id: detail.sale.id,
        }),
    ))
}
