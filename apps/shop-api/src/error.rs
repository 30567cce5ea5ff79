//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Volt POS                               │
//! │                                                                         │
//! │  Handler returns Result<T, ApiError>                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Storage failure?  ── DbError ──────────┐                               │
//! │         │                               │                               │
//! │         ▼                               ▼                               │
//! │  Business conflict? ── CoreError ──► ApiError { code, message }         │
//! │         │                               │                               │
//! │         ▼                               ▼                               │
//! │  Success ──────────────────────► HTTP status + JSON body                │
//! │                                                                         │
//! │  { "code": "INSUFFICIENT_STOCK",                                        │
//! │    "message": "Insufficient stock for Exide ML38B20L: ..." }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business-conflict messages pass through verbatim; this is an internal
//! operator tool and the message IS the operator's diagnostics. Raw
//! database failures are logged and replaced with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use volt_core::{CoreError, ValidationError};
use volt_db::{CheckoutError, DbError};

/// API error returned from HTTP handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 550e8400-..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Not enough stock for a sale line (409)
    InsufficientStock,

    /// State conflict: credit spent, payment already processed/finalised (409)
    Conflict,

    /// Finalise called before the payment was confirmed (422)
    NotConfirmed,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::InsufficientStock | ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::NotConfirmed => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{resource} not found: {id}"))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Converts validation errors to API errors.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts core business errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::ProductNotFound(_)
            | CoreError::ServiceNotFound(_)
            | CoreError::ExchangeNotFound(_)
            | CoreError::PaymentNotFound(_)
            | CoreError::SaleNotFound(_) => ApiError::new(ErrorCode::NotFound, err.to_string()),

            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }

            CoreError::ExchangeAlreadyConsumed { .. }
            | CoreError::PaymentAlreadyProcessed { .. }
            | CoreError::PaymentAlreadyFinalised { .. } => {
                ApiError::new(ErrorCode::Conflict, err.to_string())
            }

            CoreError::PaymentNotConfirmed { .. } => {
                ApiError::new(ErrorCode::NotConfirmed, err.to_string())
            }

            CoreError::Validation(v) => ApiError::validation(v.to_string()),
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{field} '{value}' already exists"),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {message}");
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::error!("Check constraint violation: {message}");
                ApiError::new(ErrorCode::DatabaseError, "Database constraint violated")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {e}");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::CorruptPayload { entity, id, message } => {
                tracing::error!("Corrupt stored payload for {entity} {id}: {message}");
                ApiError::internal("Stored payload is corrupt")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {e}");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts checkout errors (core or db) to API errors.
impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Core(e) => e.into(),
            CheckoutError::Db(e) => e.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_errors_map_to_409() {
        let err: ApiError = CoreError::ExchangeAlreadyConsumed {
            id: "x".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.code.status(), StatusCode::CONFLICT);

        let err: ApiError = CoreError::InsufficientStock {
            brand: "Exide".to_string(),
            model: "ML38B20L".to_string(),
            available: 1,
            requested: 2,
        }
        .into();
        assert_eq!(err.code.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_not_confirmed_maps_to_422() {
        let err: ApiError = CoreError::PaymentNotConfirmed {
            id: "p".to_string(),
            status: "pending".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::NotConfirmed);
        assert_eq!(err.code.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err: ApiError = CoreError::PaymentNotFound("p".to_string()).into();
        assert_eq!(err.code.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err: ApiError = ValidationError::EmptyCart.into();
        assert_eq!(err.code.status(), StatusCode::BAD_REQUEST);
    }
}
