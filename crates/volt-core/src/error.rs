//! # Error Types
//!
//! Domain-specific error types for volt-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  volt-core errors (this file)                                           │
//! │  ├── CoreError        - Business-rule violations                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  volt-db errors (separate crate)                                        │
//! │  ├── DbError          - Database operation failures                     │
//! │  └── CheckoutError    - Core + Db combined for the sale transaction     │
//! │                                                                         │
//! │  shop-api errors (in app)                                               │
//! │  └── ApiError         - What the HTTP client sees (serialized)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → ApiError → client  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (brand/model, id, status)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business-rule violations detected while processing a sale or payment.
///
/// These abort the whole operation; the caller observes either a complete
/// result or nothing (the data layer rolls back on any of these).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product id does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Service job id does not exist.
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// Exchange record id does not exist.
    #[error("Exchange record not found: {0}")]
    ExchangeNotFound(String),

    /// UPI payment intent id does not exist.
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Sale id does not exist.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Not enough stock to cover a sale line.
    ///
    /// ## When This Occurs
    /// - Requested quantity exceeds the product's current stock
    /// - Two counters racing over the last units; the loser sees this
    ///
    /// The message names brand and model so the operator knows which
    /// battery to restock or remove from the cart.
    #[error("Insufficient stock for {brand} {model}: available {available}, requested {requested}")]
    InsufficientStock {
        brand: String,
        model: String,
        available: i64,
        requested: i64,
    },

    /// Buy-back credit was already applied to another sale.
    ///
    /// Consumption is strictly one-time. A second consume attempt is an
    /// error, never a silent no-op.
    #[error("Exchange credit {id} has already been consumed")]
    ExchangeAlreadyConsumed { id: String },

    /// Confirm was called on an intent that already left `pending`.
    #[error("Payment {id} already processed (status: {status})")]
    PaymentAlreadyProcessed { id: String, status: String },

    /// Finalise was called before the payment was confirmed.
    #[error("Payment {id} not yet confirmed (status: {status})")]
    PaymentNotConfirmed { id: String, status: String },

    /// Finalise was called on an intent that already produced its sale.
    #[error("Payment {id} has already been finalised")]
    PaymentAlreadyFinalised { id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a request payload doesn't meet requirements.
/// Raised before any business logic runs, so nothing is mutated.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A cart line names neither a product nor a service.
    #[error("items[{index}] must reference a product or a service")]
    LineTargetMissing { index: usize },

    /// A cart line names both a product and a service.
    #[error("items[{index}] must reference either a product or a service, not both")]
    LineTargetAmbiguous { index: usize },

    /// Cart has no lines at all.
    #[error("cart must contain at least one item")]
    EmptyCart,

    /// Cart has exceeded the maximum number of lines.
    #[error("cart cannot have more than {max} items")]
    CartTooLarge { max: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            brand: "Exide".to_string(),
            model: "Mileage ML38B20L".to_string(),
            available: 2,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Exide Mileage ML38B20L: available 2, requested 5"
        );

        let err = CoreError::ExchangeAlreadyConsumed {
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Exchange credit abc has already been consumed");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "customer_name".to_string(),
        };
        assert_eq!(err.to_string(), "customer_name is required");

        let err = ValidationError::LineTargetAmbiguous { index: 3 };
        assert_eq!(
            err.to_string(),
            "items[3] must reference either a product or a service, not both"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::EmptyCart;
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
