//! # Domain Types
//!
//! Core domain types used throughout Volt POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    Product      │   │      Sale       │   │  PaymentIntent  │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │        │
//! │  │  brand/model    │   │  total_paise    │   │  amount_paise   │        │
//! │  │  stock          │   │  payment_method │   │  status         │        │
//! │  │  min_stock      │   │  items (child)  │   │  sale_data      │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │   ServiceJob    │   │ ExchangeRecord  │   │  PaymentStatus  │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  status         │   │  valuation      │   │  Pending        │        │
//! │  │  charge_paise   │   │  Pending/       │   │  Received       │        │
//! │  │                 │   │  Consumed       │   │  Finalised      │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A battery available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Manufacturer brand (e.g., "Exide", "Amaron").
    pub brand: String,

    /// Model designation shown on invoices.
    pub model: String,

    /// Battery category (e.g., "Car", "Bike", "Inverter").
    pub battery_type: String,

    /// Capacity rating, kept as entered (e.g., "35Ah").
    pub capacity_ah: String,

    /// Unit price in paise.
    pub price_paise: i64,

    /// Current stock level. Never negative; mutated only through the
    /// checkout engine's guarded decrement or an administrative edit.
    pub stock: i64,

    /// Threshold below which the product counts as low stock.
    pub min_stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paise(self.price_paise)
    }

    /// Checks if stock has fallen to or below the minimum threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

// =============================================================================
// Service Job
// =============================================================================

/// The status of a service job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Job accepted, not yet started.
    Pending,
    /// Technician is working on it.
    InProgress,
    /// Work done; the job becomes billable as a sale line.
    Completed,
}

impl Default for ServiceStatus {
    fn default() -> Self {
        ServiceStatus::Pending
    }
}

/// A battery service job (charging, water top-up, fitting, inspection).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ServiceJob {
    pub id: String,
    pub customer_name: String,
    pub contact_number: String,
    pub vehicle_details: String,
    pub status: ServiceStatus,
    /// Service charge in paise. Billed when the job is added to a sale.
    pub service_charge_paise: i64,
    pub battery_brand: Option<String>,
    pub battery_model: Option<String>,
    #[ts(as = "Option<String>")]
    pub pickup_date: Option<NaiveDate>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ServiceJob {
    /// Returns the service charge as Money.
    #[inline]
    pub fn charge(&self) -> Money {
        Money::from_paise(self.service_charge_paise)
    }
}

// =============================================================================
// Exchange Record
// =============================================================================

/// Lifecycle of a buy-back credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeStatus {
    /// Valuation granted, not yet applied to a sale.
    Pending,
    /// Applied as a discount; never reusable.
    Consumed,
}

/// A buy-back valuation for a customer's old battery.
///
/// Created when staff evaluate the old battery at the counter. Redeemable
/// exactly once as a discount on a future sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ExchangeRecord {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub battery_brand: String,
    pub battery_model: Option<String>,
    /// Agreed buy-back value in paise.
    pub valuation_paise: i64,
    pub status: ExchangeStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ExchangeRecord {
    /// Returns the valuation as Money.
    #[inline]
    pub fn valuation(&self) -> Money {
        Money::from_paise(self.valuation_paise)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// Whether a sale involved trading in an old battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleType {
    Sale,
    Exchange,
}

impl Default for SaleType {
    fn default() -> Self {
        SaleType::Sale
    }
}

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash at the counter.
    Cash,
    /// UPI transfer via the deferred-payment flow.
    Upi,
    /// Card payment on an external terminal.
    Card,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

/// A completed sale. Immutable once created; there is no draft state.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub vehicle_details: Option<String>,
    pub installation_address: Option<String>,
    pub product_category: Option<String>,
    pub sale_type: SaleType,
    pub total_paise: i64,
    /// Additive charges (installation, delivery).
    pub extra_charges_paise: i64,
    /// Discount applied, typically from an exchange credit.
    pub discount_paise: i64,
    pub payment_method: PaymentMethod,
    /// Buy-back credit consumed by this sale, if any.
    pub exchange_record_id: Option<String>,
    /// Client-supplied (or derived) replay-protection key. Unique.
    pub idempotency_key: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paise(self.total_paise)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale, referencing exactly one of a product or a
/// completed service job.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: Option<String>,
    pub service_id: Option<String>,
    /// Quantity sold (always 1 for service lines in practice).
    pub quantity: i64,
    /// Unit price in paise at time of sale (frozen).
    pub unit_price_paise: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_paise(self.unit_price_paise)
    }

    /// Returns the line total (unit price × quantity) as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_paise(self.unit_price_paise * self.quantity)
    }
}

// =============================================================================
// Deferred Payment Intent (UPI)
// =============================================================================

/// The status of a UPI payment intent.
///
/// ## State Machine
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │   create              confirm               finalise                    │
/// │  ────────► pending ──────────► received ──────────► finalised           │
/// │                                    │                                    │
/// │                                    └── finalise failure leaves the      │
/// │                                        intent here, retryable           │
/// │                                                                         │
/// │   (expired is reserved in the schema; no transition produces it)        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Waiting for the customer to complete the UPI transfer.
    Pending,
    /// Staff (or the client-side timeout) asserted the money arrived.
    Received,
    /// The sale has been created from the stored cart.
    Finalised,
    /// Reserved; never produced by any transition.
    Expired,
}

impl PaymentStatus {
    /// Lowercase wire name, matching the database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Received => "received",
            PaymentStatus::Finalised => "finalised",
            PaymentStatus::Expired => "expired",
        }
    }
}

/// A staged UPI payment: the cart is parked here until the transfer is
/// confirmed, then finalised into a real sale exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentIntent {
    pub id: String,
    pub amount_paise: i64,
    pub status: PaymentStatus,
    /// The validated cart, serialized as JSON at creation time.
    pub sale_data: String,
    /// Opaque invoice-rendering payload the frontend parked alongside
    /// the cart. Stored and echoed back, never interpreted.
    pub invoice_state: Option<String>,
    /// Optional UPI transaction reference captured at confirmation.
    pub upi_ref: Option<String>,
    /// The sale created at finalisation. Set exactly once.
    pub sale_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl PaymentIntent {
    /// Returns the staged amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_paise(self.amount_paise)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(stock: i64, min_stock: i64) -> Product {
        Product {
            id: "p1".to_string(),
            brand: "Exide".to_string(),
            model: "ML38B20L".to_string(),
            battery_type: "Car".to_string(),
            capacity_ah: "35Ah".to_string(),
            price_paise: 450000,
            stock,
            min_stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_low_stock_threshold() {
        assert!(product(2, 2).is_low_stock());
        assert!(product(1, 2).is_low_stock());
        assert!(!product(3, 2).is_low_stock());
    }

    #[test]
    fn test_sale_item_line_total() {
        let item = SaleItem {
            id: "i1".to_string(),
            sale_id: "s1".to_string(),
            product_id: Some("p1".to_string()),
            service_id: None,
            quantity: 3,
            unit_price_paise: 450000,
            created_at: Utc::now(),
        };
        assert_eq!(item.line_total().paise(), 1350000);
    }

    #[test]
    fn test_payment_status_wire_names() {
        assert_eq!(PaymentStatus::Pending.as_str(), "pending");
        assert_eq!(PaymentStatus::Finalised.as_str(), "finalised");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(ServiceStatus::default(), ServiceStatus::Pending);
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
        assert_eq!(SaleType::default(), SaleType::Sale);
    }
}
