//! # Validation Module
//!
//! Input validation utilities for Volt POS.
//!
//! Cart-shape rules live in [`crate::cart`]; this module holds the field
//! validators shared by the CRUD surfaces (products, services, exchange
//! records) and by the payment endpoints.

use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required name field (customer, brand, model).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 200 characters
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates an optional search filter (e.g., pending-exchange customer
/// lookup).
///
/// ## Rules
/// - Can be empty (no filtering)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed filter string.
pub fn validate_filter(value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "filter".to_string(),
            max: 100,
        });
    }

    Ok(value.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed 999
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an amount in paise.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free service, zero-rupee intent)
pub fn validate_amount_paise(field: &str, paise: i64) -> ValidationResult<()> {
    if paise < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level.
///
/// Stock can be zero (sold out) but never negative.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use volt_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("customer_name", "Ravi Kumar").is_ok());
        assert!(validate_name("customer_name", "").is_err());
        assert!(validate_name("customer_name", "   ").is_err());
        assert!(validate_name("customer_name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_filter() {
        assert_eq!(validate_filter("  ravi ").unwrap(), "ravi");
        assert_eq!(validate_filter("").unwrap(), "");
        assert!(validate_filter(&"A".repeat(200)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_amount_paise() {
        assert!(validate_amount_paise("amount", 0).is_ok());
        assert!(validate_amount_paise("amount", 450000).is_ok());
        assert!(validate_amount_paise("amount", -1).is_err());
    }

    #[test]
    fn test_validate_stock() {
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(50).is_ok());
        assert!(validate_stock(-1).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
