//! # Exchange Repository
//!
//! Database operations for battery buy-back credits.
//!
//! ## One-Time Consumption
//! A credit is granted once (staff values the old battery) and consumed at
//! most once (applied as a discount on a sale). Consumption happens inside
//! the sale transaction via a guarded status transition:
//!
//! ```text
//!   UPDATE exchange_records SET status = 'consumed'
//!   WHERE id = ? AND status = 'pending'
//! ```
//!
//! Zero rows affected means the credit was already spent (or never
//! existed); the sale transaction aborts and rolls back.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::checkout::CheckoutError;
use crate::error::{DbError, DbResult};
use volt_core::{CoreError, ExchangeRecord, ExchangeStatus};

/// Repository for exchange-record database operations.
#[derive(Debug, Clone)]
pub struct ExchangeRepository {
    pool: SqlitePool,
}

impl ExchangeRepository {
    /// Creates a new ExchangeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExchangeRepository { pool }
    }

    /// Lists all exchange records, newest first.
    pub async fn list(&self) -> DbResult<Vec<ExchangeRecord>> {
        let records = sqlx::query_as::<_, ExchangeRecord>(
            r#"
            SELECT id, customer_name, customer_phone, customer_address,
                   battery_brand, battery_model, valuation_paise, status,
                   created_at, updated_at
            FROM exchange_records
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Lists pending (unredeemed) credits, newest first, optionally
    /// filtered by a customer-name substring.
    ///
    /// Used by the checkout screen to offer applicable buy-back discounts.
    pub async fn list_pending(&self, customer_name: Option<&str>) -> DbResult<Vec<ExchangeRecord>> {
        let records = match customer_name.filter(|f| !f.is_empty()) {
            Some(filter) => {
                let pattern = format!("%{}%", filter);
                sqlx::query_as::<_, ExchangeRecord>(
                    r#"
                    SELECT id, customer_name, customer_phone, customer_address,
                           battery_brand, battery_model, valuation_paise, status,
                           created_at, updated_at
                    FROM exchange_records
                    WHERE status = 'pending' AND customer_name LIKE ?1
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ExchangeRecord>(
                    r#"
                    SELECT id, customer_name, customer_phone, customer_address,
                           battery_brand, battery_model, valuation_paise, status,
                           created_at, updated_at
                    FROM exchange_records
                    WHERE status = 'pending'
                    ORDER BY created_at DESC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(records)
    }

    /// Gets an exchange record by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ExchangeRecord>> {
        let record = sqlx::query_as::<_, ExchangeRecord>(
            r#"
            SELECT id, customer_name, customer_phone, customer_address,
                   battery_brand, battery_model, valuation_paise, status,
                   created_at, updated_at
            FROM exchange_records
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Inserts a new exchange record (always pending).
    pub async fn insert(&self, record: &ExchangeRecord) -> DbResult<()> {
        debug!(id = %record.id, customer = %record.customer_name, "Inserting exchange record");

        sqlx::query(
            r#"
            INSERT INTO exchange_records (
                id, customer_name, customer_phone, customer_address,
                battery_brand, battery_model, valuation_paise, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&record.id)
        .bind(&record.customer_name)
        .bind(&record.customer_phone)
        .bind(&record.customer_address)
        .bind(&record.battery_brand)
        .bind(&record.battery_model)
        .bind(record.valuation_paise)
        .bind(record.status)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an exchange record (administrative correction).
    pub async fn update(&self, record: &ExchangeRecord) -> DbResult<()> {
        debug!(id = %record.id, "Updating exchange record");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE exchange_records SET
                customer_name = ?2,
                customer_phone = ?3,
                customer_address = ?4,
                battery_brand = ?5,
                battery_model = ?6,
                valuation_paise = ?7,
                status = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&record.id)
        .bind(&record.customer_name)
        .bind(&record.customer_phone)
        .bind(&record.customer_address)
        .bind(&record.battery_brand)
        .bind(&record.battery_model)
        .bind(record.valuation_paise)
        .bind(record.status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Exchange record", &record.id));
        }

        Ok(())
    }

    /// Deletes an exchange record.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting exchange record");

        let result = sqlx::query("DELETE FROM exchange_records WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Exchange record", id));
        }

        Ok(())
    }

    /// Consumes a pending credit, inside the caller's sale transaction.
    ///
    /// ## Failure
    /// * `CoreError::ExchangeNotFound` - no such credit id
    /// * `CoreError::ExchangeAlreadyConsumed` - credit was already spent;
    ///   a second consume is an error, never a no-op
    pub(crate) async fn consume_in_tx(
        conn: &mut SqliteConnection,
        exchange_id: &str,
    ) -> Result<(), CheckoutError> {
        debug!(exchange_id = %exchange_id, "Consuming exchange credit");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE exchange_records
            SET status = 'consumed', updated_at = ?2
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(exchange_id)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            let status: Option<ExchangeStatus> =
                sqlx::query_scalar("SELECT status FROM exchange_records WHERE id = ?1")
                    .bind(exchange_id)
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(DbError::from)?;

            return match status {
                None => Err(CoreError::ExchangeNotFound(exchange_id.to_string()).into()),
                Some(_) => Err(CoreError::ExchangeAlreadyConsumed {
                    id: exchange_id.to_string(),
                }
                .into()),
            };
        }

        Ok(())
    }
}

/// Helper to generate a new exchange record ID.
pub fn generate_exchange_id() -> String {
    Uuid::new_v4().to_string()
}
