//! Exchange record (battery buy-back) handlers.
//!
//! Staff value the customer's old battery here; the resulting pending
//! credit shows up on the checkout screen via `/api/exchanges/pending`
//! and is consumed by the sale transaction.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use volt_core::validation::{validate_amount_paise, validate_filter, validate_name};
use volt_core::{ExchangeRecord, ExchangeStatus};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/exchanges", get(list).post(create))
        .route("/api/exchanges/pending", get(list_pending))
        .route(
            "/api/exchanges/{id}",
            get(get_by_id).put(update).delete(delete),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateExchangeRequest {
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub battery_brand: String,
    pub battery_model: Option<String>,
    pub valuation_paise: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateExchangeRequest {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub battery_brand: Option<String>,
    pub battery_model: Option<String>,
    pub valuation_paise: Option<i64>,
    pub status: Option<ExchangeStatus>,
}

#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    pub customer_name: Option<String>,
}

/// GET /api/exchanges - newest first
async fn list(State(state): State<AppState>) -> Result<Json<Vec<ExchangeRecord>>, ApiError> {
    let records = state.db.exchanges().list().await?;
    Ok(Json(records))
}

/// GET /api/exchanges/pending?customer_name= - unredeemed credits
async fn list_pending(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<Vec<ExchangeRecord>>, ApiError> {
    let filter = match &query.customer_name {
        Some(raw) => Some(validate_filter(raw)?),
        None => None,
    };

    let records = state
        .db
        .exchanges()
        .list_pending(filter.as_deref())
        .await?;
    Ok(Json(records))
}

/// GET /api/exchanges/{id}
async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExchangeRecord>, ApiError> {
    let record = state
        .db
        .exchanges()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Exchange record", &id))?;
    Ok(Json(record))
}

/// POST /api/exchanges - grant a buy-back valuation
async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateExchangeRequest>,
) -> Result<(StatusCode, Json<ExchangeRecord>), ApiError> {
    validate_name("customer_name", &req.customer_name)?;
    validate_name("battery_brand", &req.battery_brand)?;
    validate_amount_paise("valuation", req.valuation_paise)?;

    let now = Utc::now();
    let record = ExchangeRecord {
        id: Uuid::new_v4().to_string(),
        customer_name: req.customer_name,
        customer_phone: req.customer_phone,
        customer_address: req.customer_address,
        battery_brand: req.battery_brand,
        battery_model: req.battery_model,
        valuation_paise: req.valuation_paise,
        status: ExchangeStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    state.db.exchanges().insert(&record).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/exchanges/{id} - administrative correction
async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateExchangeRequest>,
) -> Result<Json<ExchangeRecord>, ApiError> {
    let mut record = state
        .db
        .exchanges()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Exchange record", &id))?;

    if let Some(customer_name) = req.customer_name {
        validate_name("customer_name", &customer_name)?;
        record.customer_name = customer_name;
    }
    if req.customer_phone.is_some() {
        record.customer_phone = req.customer_phone;
    }
    if req.customer_address.is_some() {
        record.customer_address = req.customer_address;
    }
    if let Some(battery_brand) = req.battery_brand {
        validate_name("battery_brand", &battery_brand)?;
        record.battery_brand = battery_brand;
    }
    if req.battery_model.is_some() {
        record.battery_model = req.battery_model;
    }
    if let Some(valuation_paise) = req.valuation_paise {
        validate_amount_paise("valuation", valuation_paise)?;
        record.valuation_paise = valuation_paise;
    }
    if let Some(status) = req.status {
        record.status = status;
    }

    state.db.exchanges().update(&record).await?;

    let updated = state
        .db
        .exchanges()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Exchange record", &id))?;
    Ok(Json(updated))
}

/// DELETE /api/exchanges/{id}
async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.exchanges().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
