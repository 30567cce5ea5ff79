//! Product (battery inventory) handlers.
//!
//! Administrative CRUD. Stock edits here are corrections/restocks; the
//! checkout engine owns sale-time decrements.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use volt_core::validation::{validate_amount_paise, validate_name, validate_stock};
use volt_core::Product;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list).post(create))
        .route("/api/products/low-stock", get(list_low_stock))
        .route(
            "/api/products/{id}",
            get(get_by_id).put(update).delete(delete),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub brand: String,
    pub model: String,
    pub battery_type: String,
    pub capacity_ah: String,
    pub price_paise: i64,
    pub stock: i64,
    pub min_stock: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub battery_type: Option<String>,
    pub capacity_ah: Option<String>,
    pub price_paise: Option<i64>,
    pub stock: Option<i64>,
    pub min_stock: Option<i64>,
}

/// GET /api/products - full inventory list
async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.db.products().list().await?;
    Ok(Json(products))
}

/// GET /api/products/low-stock - items at or below their threshold
async fn list_low_stock(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.db.products().list_low_stock().await?;
    Ok(Json(products))
}

/// GET /api/products/{id}
async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;
    Ok(Json(product))
}

/// POST /api/products
async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    validate_name("brand", &req.brand)?;
    validate_name("model", &req.model)?;
    validate_name("battery_type", &req.battery_type)?;
    validate_amount_paise("price", req.price_paise)?;
    validate_stock(req.stock)?;
    validate_stock(req.min_stock)?;

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        brand: req.brand,
        model: req.model,
        battery_type: req.battery_type,
        capacity_ah: req.capacity_ah,
        price_paise: req.price_paise,
        stock: req.stock,
        min_stock: req.min_stock,
        created_at: now,
        updated_at: now,
    };

    state.db.products().insert(&product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/{id} - partial update
async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    let mut product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    if let Some(brand) = req.brand {
        validate_name("brand", &brand)?;
        product.brand = brand;
    }
    if let Some(model) = req.model {
        validate_name("model", &model)?;
        product.model = model;
    }
    if let Some(battery_type) = req.battery_type {
        validate_name("battery_type", &battery_type)?;
        product.battery_type = battery_type;
    }
    if let Some(capacity_ah) = req.capacity_ah {
        product.capacity_ah = capacity_ah;
    }
    if let Some(price_paise) = req.price_paise {
        validate_amount_paise("price", price_paise)?;
        product.price_paise = price_paise;
    }
    if let Some(stock) = req.stock {
        validate_stock(stock)?;
        product.stock = stock;
    }
    if let Some(min_stock) = req.min_stock {
        validate_stock(min_stock)?;
        product.min_stock = min_stock;
    }

    state.db.products().update(&product).await?;

    let updated = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;
    Ok(Json(updated))
}

/// DELETE /api/products/{id}
async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.products().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
