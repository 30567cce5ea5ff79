//! # Payment Repository
//!
//! Database operations for UPI payment intents.
//!
//! An intent parks a validated cart while the customer completes the UPI
//! transfer. Status moves `pending → received → finalised`; the
//! received→finalised step belongs to the checkout engine because it must
//! share a transaction with the sale it creates (see `checkout.rs`).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::checkout::CheckoutError;
use crate::error::{DbError, DbResult};
use volt_core::{Cart, CoreError, PaymentIntent, PaymentStatus};

/// Repository for UPI payment-intent operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Creates a new pending intent holding the validated cart.
    ///
    /// The cart arrives already validated (`CartDraft::into_cart` at the
    /// API boundary) and is stored as JSON, so finalisation can only fail
    /// on business conflicts, never on shape.
    pub async fn create(
        &self,
        amount_paise: i64,
        cart: &Cart,
        invoice_state: Option<&serde_json::Value>,
    ) -> DbResult<PaymentIntent> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let sale_data = serde_json::to_string(cart)
            .map_err(|e| DbError::Internal(format!("cart serialization failed: {e}")))?;
        let invoice_state = invoice_state
            .map(|v| {
                serde_json::to_string(v)
                    .map_err(|e| DbError::Internal(format!("invoice state serialization failed: {e}")))
            })
            .transpose()?;

        debug!(id = %id, amount = %amount_paise, "Creating payment intent");

        let intent = PaymentIntent {
            id: id.clone(),
            amount_paise,
            status: PaymentStatus::Pending,
            sale_data,
            invoice_state,
            upi_ref: None,
            sale_id: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO upi_payments (
                id, amount_paise, status, sale_data, invoice_state,
                upi_ref, sale_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&intent.id)
        .bind(intent.amount_paise)
        .bind(intent.status)
        .bind(&intent.sale_data)
        .bind(&intent.invoice_state)
        .bind(&intent.upi_ref)
        .bind(&intent.sale_id)
        .bind(intent.created_at)
        .bind(intent.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(intent)
    }

    /// Gets an intent by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PaymentIntent>> {
        let intent = sqlx::query_as::<_, PaymentIntent>(
            r#"
            SELECT id, amount_paise, status, sale_data, invoice_state,
                   upi_ref, sale_id, created_at, updated_at
            FROM upi_payments
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(intent)
    }

    /// Reads the current status. Pure read; the client polls this.
    pub async fn status(&self, id: &str) -> DbResult<Option<PaymentStatus>> {
        let status: Option<PaymentStatus> =
            sqlx::query_scalar("SELECT status FROM upi_payments WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(status)
    }

    /// Confirms the transfer arrived: guarded pending → received.
    ///
    /// Called by the counter operator, or by the client after its local
    /// "customer returned from the UPI app" delay. Stores the optional
    /// transaction reference. Does NOT create a sale.
    ///
    /// ## Failure
    /// * `CoreError::PaymentNotFound` - no such intent
    /// * `CoreError::PaymentAlreadyProcessed` - status already left pending
    pub async fn confirm(
        &self,
        id: &str,
        upi_ref: Option<&str>,
    ) -> Result<PaymentStatus, CheckoutError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE upi_payments
            SET status = 'received', upi_ref = ?2, updated_at = ?3
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(upi_ref)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            let status = self.status(id).await?;
            return match status {
                None => Err(CoreError::PaymentNotFound(id.to_string()).into()),
                Some(status) => Err(CoreError::PaymentAlreadyProcessed {
                    id: id.to_string(),
                    status: status.as_str().to_string(),
                }
                .into()),
            };
        }

        info!(id = %id, "Payment confirmed");
        Ok(PaymentStatus::Received)
    }
}
