//! # Cart Module
//!
//! The validated cart: what a counter submission looks like after every
//! shape check has passed and before the checkout engine touches the
//! database.
//!
//! ## Two Representations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cart Validation Boundary                           │
//! │                                                                         │
//! │  HTTP request body                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CartDraft          items carry optional product_id / service_id        │
//! │       │             exactly as the frontend sends them                  │
//! │       │                                                                 │
//! │       │  CartDraft::into_cart()   ← every rule checked here             │
//! │       ▼                                                                 │
//! │  Cart               lines are a tagged sum type: a line IS a            │
//! │       │             product line or a service line, nothing else        │
//! │       ▼                                                                 │
//! │  CheckoutEngine / stored as a PaymentIntent's sale_data                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A UPI intent stores the validated `Cart` (as JSON), not the raw draft,
//! so a malformed cart is rejected when the intent is created rather than
//! surfacing minutes later at finalisation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{PaymentMethod, SaleType};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Customer Info
// =============================================================================

/// Customer details captured at the counter.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: Option<String>,
    pub vehicle_details: Option<String>,
    pub installation_address: Option<String>,
    pub product_category: Option<String>,
}

// =============================================================================
// Cart Lines
// =============================================================================

/// One validated cart line. A line references exactly one sellable thing;
/// the type makes the "product XOR service" rule unrepresentable rather
/// than checked.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartLine {
    /// A battery off the shelf.
    Product {
        product_id: String,
        quantity: i64,
        unit_price_paise: i64,
    },
    /// A completed service job billed onto this sale.
    Service {
        service_id: String,
        quantity: i64,
        unit_price_paise: i64,
    },
}

impl CartLine {
    /// Quantity for this line.
    pub fn quantity(&self) -> i64 {
        match self {
            CartLine::Product { quantity, .. } | CartLine::Service { quantity, .. } => *quantity,
        }
    }

    /// Frozen unit price for this line.
    pub fn unit_price(&self) -> Money {
        match self {
            CartLine::Product {
                unit_price_paise, ..
            }
            | CartLine::Service {
                unit_price_paise, ..
            } => Money::from_paise(*unit_price_paise),
        }
    }

    /// Line total (unit price × quantity).
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity())
    }
}

// =============================================================================
// Validated Cart
// =============================================================================

/// A fully validated cart, ready for the checkout engine.
///
/// Construct via [`CartDraft::into_cart`]; a `Cart` deserialized from a
/// stored intent payload was validated when the intent was created.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub customer: CustomerInfo,
    pub sale_type: SaleType,
    pub lines: Vec<CartLine>,
    pub total_paise: i64,
    pub extra_charges_paise: i64,
    pub discount_paise: i64,
    /// Buy-back credit to consume as part of this sale.
    pub exchange_record_id: Option<String>,
    pub payment_method: PaymentMethod,
}

impl Cart {
    /// Re-checks every cart rule.
    ///
    /// `CartDraft::into_cart` already enforces these; this exists so the
    /// checkout engine can cheaply assert a deserialized payload is still
    /// well-formed before opening a transaction.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.customer.name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "customer_name".to_string(),
            });
        }

        if self.lines.is_empty() {
            return Err(ValidationError::EmptyCart);
        }

        if self.lines.len() > MAX_CART_ITEMS {
            return Err(ValidationError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        for line in &self.lines {
            let qty = line.quantity();
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
            if line.unit_price().is_negative() {
                return Err(ValidationError::MustNotBeNegative {
                    field: "price".to_string(),
                });
            }
        }

        for (field, paise) in [
            ("total_amount", self.total_paise),
            ("extra_charges", self.extra_charges_paise),
            ("discount_amount", self.discount_paise),
        ] {
            if paise < 0 {
                return Err(ValidationError::MustNotBeNegative {
                    field: field.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Sum of all line totals, before extra charges and discount.
    pub fn lines_total(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::zero(), |acc, line| acc + line.line_total())
    }
}

// =============================================================================
// Wire Draft
// =============================================================================

/// One line as the frontend submits it: two optional ids, of which
/// exactly one must be set.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLineDraft {
    pub product_id: Option<String>,
    pub service_id: Option<String>,
    pub quantity: i64,
    pub unit_price_paise: i64,
}

/// The raw checkout submission, before validation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartDraft {
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub vehicle_details: Option<String>,
    pub installation_address: Option<String>,
    pub product_category: Option<String>,
    pub sale_type: Option<SaleType>,
    pub items: Vec<CartLineDraft>,
    pub total_paise: i64,
    pub extra_charges_paise: Option<i64>,
    pub discount_paise: Option<i64>,
    pub exchange_record_id: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

impl CartDraft {
    /// Validates the draft and produces the tagged [`Cart`].
    ///
    /// ## Rules
    /// - customer name present
    /// - 1..=100 lines, each naming exactly one of product/service
    /// - 1 <= quantity <= 999 per line
    /// - every amount non-negative
    pub fn into_cart(self) -> Result<Cart, ValidationError> {
        let mut lines = Vec::with_capacity(self.items.len());

        for (index, item) in self.items.iter().enumerate() {
            let line = match (&item.product_id, &item.service_id) {
                (Some(product_id), None) => CartLine::Product {
                    product_id: product_id.clone(),
                    quantity: item.quantity,
                    unit_price_paise: item.unit_price_paise,
                },
                (None, Some(service_id)) => CartLine::Service {
                    service_id: service_id.clone(),
                    quantity: item.quantity,
                    unit_price_paise: item.unit_price_paise,
                },
                (Some(_), Some(_)) => {
                    return Err(ValidationError::LineTargetAmbiguous { index })
                }
                (None, None) => return Err(ValidationError::LineTargetMissing { index }),
            };
            lines.push(line);
        }

        let cart = Cart {
            customer: CustomerInfo {
                name: self.customer_name,
                phone: self.customer_phone,
                vehicle_details: self.vehicle_details,
                installation_address: self.installation_address,
                product_category: self.product_category,
            },
            sale_type: self.sale_type.unwrap_or_default(),
            lines,
            total_paise: self.total_paise,
            extra_charges_paise: self.extra_charges_paise.unwrap_or(0),
            discount_paise: self.discount_paise.unwrap_or(0),
            exchange_record_id: self.exchange_record_id,
            payment_method: self.payment_method.unwrap_or_default(),
        };

        cart.validate()?;
        Ok(cart)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_with_items(items: Vec<CartLineDraft>) -> CartDraft {
        CartDraft {
            customer_name: "Ravi Kumar".to_string(),
            customer_phone: Some("9876543210".to_string()),
            vehicle_details: None,
            installation_address: None,
            product_category: None,
            sale_type: None,
            items,
            total_paise: 450000,
            extra_charges_paise: None,
            discount_paise: None,
            exchange_record_id: None,
            payment_method: None,
        }
    }

    fn product_line(qty: i64) -> CartLineDraft {
        CartLineDraft {
            product_id: Some("p1".to_string()),
            service_id: None,
            quantity: qty,
            unit_price_paise: 450000,
        }
    }

    #[test]
    fn test_draft_to_cart_product_line() {
        let cart = draft_with_items(vec![product_line(2)]).into_cart().unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert!(matches!(cart.lines[0], CartLine::Product { .. }));
        assert_eq!(cart.payment_method, PaymentMethod::Cash);
        assert_eq!(cart.lines_total().paise(), 900000);
    }

    #[test]
    fn test_draft_rejects_empty_cart() {
        let err = draft_with_items(vec![]).into_cart().unwrap_err();
        assert!(matches!(err, ValidationError::EmptyCart));
    }

    #[test]
    fn test_draft_rejects_line_with_both_targets() {
        let err = draft_with_items(vec![CartLineDraft {
            product_id: Some("p1".to_string()),
            service_id: Some("s1".to_string()),
            quantity: 1,
            unit_price_paise: 100,
        }])
        .into_cart()
        .unwrap_err();
        assert!(matches!(err, ValidationError::LineTargetAmbiguous { index: 0 }));
    }

    #[test]
    fn test_draft_rejects_line_with_no_target() {
        let err = draft_with_items(vec![CartLineDraft {
            product_id: None,
            service_id: None,
            quantity: 1,
            unit_price_paise: 100,
        }])
        .into_cart()
        .unwrap_err();
        assert!(matches!(err, ValidationError::LineTargetMissing { index: 0 }));
    }

    #[test]
    fn test_draft_rejects_zero_quantity() {
        let err = draft_with_items(vec![product_line(0)]).into_cart().unwrap_err();
        assert!(matches!(err, ValidationError::MustBePositive { .. }));
    }

    #[test]
    fn test_draft_rejects_oversized_quantity() {
        let err = draft_with_items(vec![product_line(1000)])
            .into_cart()
            .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn test_draft_rejects_negative_amounts() {
        let mut draft = draft_with_items(vec![product_line(1)]);
        draft.discount_paise = Some(-1);
        let err = draft.into_cart().unwrap_err();
        assert!(matches!(err, ValidationError::MustNotBeNegative { .. }));
    }

    #[test]
    fn test_draft_rejects_blank_customer() {
        let mut draft = draft_with_items(vec![product_line(1)]);
        draft.customer_name = "   ".to_string();
        let err = draft.into_cart().unwrap_err();
        assert!(matches!(err, ValidationError::Required { .. }));
    }

    #[test]
    fn test_cart_round_trips_through_json() {
        // The payment intent stores the validated cart as JSON and replays
        // it at finalisation; the tagged representation must survive.
        let cart = draft_with_items(vec![product_line(2)]).into_cart().unwrap();
        let json = serde_json::to_string(&cart).unwrap();
        let back: Cart = serde_json::from_str(&json).unwrap();
        assert!(back.validate().is_ok());
        assert_eq!(back.lines.len(), 1);
        assert_eq!(back.lines[0].quantity(), 2);
    }
}
