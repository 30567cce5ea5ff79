//! # volt-core: Pure Business Logic for Volt POS
//!
//! This crate is the **heart** of the battery-shop backend. It contains
//! all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Volt POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    shop-api (axum)                              │    │
//! │  │    /api/sales  /api/upi-payments  /api/products  ...            │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ volt-core (THIS CRATE) ★                        │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐    │    │
//! │  │   │   types   │  │   money   │  │   cart    │  │ validation│    │    │
//! │  │   │  Product  │  │   Money   │  │   Cart    │  │   rules   │    │    │
//! │  │   │   Sale    │  │  (paise)  │  │ CartLine  │  │  checks   │    │    │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘    │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                    volt-db (Database Layer)                     │    │
//! │  │         SQLite queries, migrations, checkout engine             │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, PaymentIntent, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Validated cart and its wire-format draft
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are paise (i64), never floats
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use volt_core::Money` instead of
// `use volt_core::money::Money`

pub use cart::{Cart, CartDraft, CartLine, CartLineDraft, CustomerInfo};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps invoices printable on one page.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in a cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 100 instead of 10);
/// no counter sale moves hundreds of one battery at once.
pub const MAX_ITEM_QUANTITY: i64 = 999;
