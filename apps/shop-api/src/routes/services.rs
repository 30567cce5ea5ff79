//! Service job handlers.
//!
//! Staff create a job when a battery comes in, move it through
//! pending → in_progress → completed, and bill it onto a sale from the
//! checkout screen once completed.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use volt_core::validation::{validate_amount_paise, validate_name};
use volt_core::{ServiceJob, ServiceStatus};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/services", get(list).post(create))
        .route(
            "/api/services/{id}",
            get(get_by_id).put(update).delete(delete),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub customer_name: String,
    pub contact_number: String,
    pub vehicle_details: String,
    pub status: Option<ServiceStatus>,
    pub service_charge_paise: Option<i64>,
    pub battery_brand: Option<String>,
    pub battery_model: Option<String>,
    pub pickup_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateServiceRequest {
    pub customer_name: Option<String>,
    pub contact_number: Option<String>,
    pub vehicle_details: Option<String>,
    pub status: Option<ServiceStatus>,
    pub service_charge_paise: Option<i64>,
    pub battery_brand: Option<String>,
    pub battery_model: Option<String>,
    pub pickup_date: Option<NaiveDate>,
}

/// GET /api/services - newest first
async fn list(State(state): State<AppState>) -> Result<Json<Vec<ServiceJob>>, ApiError> {
    let services = state.db.services().list().await?;
    Ok(Json(services))
}

/// GET /api/services/{id}
async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ServiceJob>, ApiError> {
    let service = state
        .db
        .services()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service", &id))?;
    Ok(Json(service))
}

/// POST /api/services
async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ServiceJob>), ApiError> {
    validate_name("customer_name", &req.customer_name)?;
    validate_name("contact_number", &req.contact_number)?;
    validate_name("vehicle_details", &req.vehicle_details)?;
    let charge = req.service_charge_paise.unwrap_or(0);
    validate_amount_paise("service_charge", charge)?;

    let now = Utc::now();
    let service = ServiceJob {
        id: Uuid::new_v4().to_string(),
        customer_name: req.customer_name,
        contact_number: req.contact_number,
        vehicle_details: req.vehicle_details,
        status: req.status.unwrap_or_default(),
        service_charge_paise: charge,
        battery_brand: req.battery_brand,
        battery_model: req.battery_model,
        pickup_date: req.pickup_date,
        created_at: now,
        updated_at: now,
    };

    state.db.services().insert(&service).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

/// PUT /api/services/{id} - partial update, including status transitions
async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateServiceRequest>,
) -> Result<Json<ServiceJob>, ApiError> {
    let mut service = state
        .db
        .services()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service", &id))?;

    if let Some(customer_name) = req.customer_name {
        validate_name("customer_name", &customer_name)?;
        service.customer_name = customer_name;
    }
    if let Some(contact_number) = req.contact_number {
        validate_name("contact_number", &contact_number)?;
        service.contact_number = contact_number;
    }
    if let Some(vehicle_details) = req.vehicle_details {
        validate_name("vehicle_details", &vehicle_details)?;
        service.vehicle_details = vehicle_details;
    }
    if let Some(status) = req.status {
        service.status = status;
    }
    if let Some(charge) = req.service_charge_paise {
        validate_amount_paise("service_charge", charge)?;
        service.service_charge_paise = charge;
    }
    if req.battery_brand.is_some() {
        service.battery_brand = req.battery_brand;
    }
    if req.battery_model.is_some() {
        service.battery_model = req.battery_model;
    }
    if req.pickup_date.is_some() {
        service.pickup_date = req.pickup_date;
    }

    state.db.services().update(&service).await?;

    let updated = state
        .db
        .services()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service", &id))?;
    Ok(Json(updated))
}

/// DELETE /api/services/{id}
async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.services().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
