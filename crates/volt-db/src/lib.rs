//! # volt-db: Database Layer for Volt POS
//!
//! This crate provides database access for the battery-shop backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Volt POS Data Flow                               │
//! │                                                                         │
//! │  axum handler (POST /api/sales)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                      volt-db (THIS CRATE)                       │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌──────────────┐      │    │
//! │  │   │   Database    │   │  Repositories │   │   Checkout   │      │    │
//! │  │   │   (pool.rs)   │   │ product, sale │   │   Engine     │      │    │
//! │  │   │               │◄──│ exchange,     │◄──│ (the sale    │      │    │
//! │  │   │ SqlitePool    │   │ service,      │   │ transaction) │      │    │
//! │  │   │ WAL + FK      │   │ payment       │   │              │      │    │
//! │  │   └───────────────┘   └───────────────┘   └──────────────┘      │    │
//! │  │                                                                 │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (voltpos.db)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-table repositories
//! - [`checkout`] - The sale transaction and UPI finalisation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use volt_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("data/voltpos.db")).await?;
//!
//! let pending = db.exchanges().list_pending(None).await?;
//! let sale = db.checkout().create_sale(&cart, None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CheckoutEngine, CheckoutError};
pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::exchange::ExchangeRepository;
pub use repository::payment::PaymentRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::{SaleDetail, SaleItemDetail, SaleRepository};
pub use repository::service::ServiceRepository;
