//! # Checkout Engine
//!
//! The sale transaction: turns a validated cart into a persisted sale plus
//! all of its side effects, all-or-nothing.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     create_sale(cart) - one transaction                 │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    1. INSERT sale header          (final immediately, no draft state)   │
//! │    2. consume exchange credit     (guarded pending→consumed, if any)    │
//! │    3. per product line:                                                 │
//! │         guarded stock decrement   (stock = stock - q WHERE stock >= q)  │
//! │       per service line:                                                 │
//! │         verify the job exists                                           │
//! │    4. INSERT sale items                                                 │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure at any step rolls back every step: the caller observes     │
//! │  a complete sale or no sale at all.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The header insert is deliberately the first statement so the transaction
//! takes the database write lock up front; concurrent checkouts then
//! serialize cleanly instead of failing on a read-to-write lock upgrade.
//!
//! ## UPI Finalisation
//! `finalise_payment` wraps the same sale creation in the intent's guarded
//! received→finalised transition. Both run in ONE transaction, which gives
//! exactly-once semantics for free:
//! - two concurrent finalise calls serialize on the write lock; the loser's
//!   guarded transition affects zero rows and is rejected
//! - if sale creation fails, the transition rolls back with it and the
//!   intent stays `received`, retryable after the operator fixes the cause

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::exchange::ExchangeRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::{
    generate_sale_id, generate_sale_item_id, SaleDetail, SaleRepository,
};
use crate::repository::service::ServiceRepository;
use volt_core::{Cart, CartLine, CoreError, PaymentStatus, Sale, SaleItem};

// =============================================================================
// Error Type
// =============================================================================

/// Errors from the checkout engine: business-rule violations from
/// volt-core, or storage failures from this crate.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Checkout Engine
// =============================================================================

/// Executes the sale transaction and the UPI finalisation.
#[derive(Debug, Clone)]
pub struct CheckoutEngine {
    pool: SqlitePool,
}

impl CheckoutEngine {
    /// Creates a new CheckoutEngine.
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutEngine { pool }
    }

    fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Atomically converts a validated cart into a persisted sale.
    ///
    /// ## Arguments
    /// * `cart` - the validated cart (see `volt_core::CartDraft::into_cart`)
    /// * `idempotency_key` - optional replay-protection key; a retried
    ///   submission with the same key returns the original sale without
    ///   decrementing stock again
    ///
    /// ## Returns
    /// The persisted sale with line items resolved (product/service rows
    /// joined in).
    ///
    /// ## Failure
    /// Everything rolls back. `InsufficientStock` and
    /// `ExchangeAlreadyConsumed` are the interesting conflicts; the caller
    /// re-fetches current stock and resubmits.
    pub async fn create_sale(
        &self,
        cart: &Cart,
        idempotency_key: Option<&str>,
    ) -> CheckoutResult<SaleDetail> {
        cart.validate().map_err(CoreError::Validation)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let result = Self::create_sale_in_tx(&mut tx, cart, idempotency_key, now).await;

        match result {
            Ok(sale) => {
                tx.commit().await.map_err(DbError::from)?;
                info!(
                    sale_id = %sale.id,
                    total = %sale.total_paise,
                    items = cart.lines.len(),
                    "Sale created"
                );
                Ok(self.sales().expect_detail(&sale.id).await?)
            }
            Err(err) => {
                if let Err(rb_err) = tx.rollback().await {
                    warn!(error = %rb_err, "Rollback after failed checkout also failed");
                }

                // A duplicate idempotency key means this cart already went
                // through; answer with the original sale instead of erroring.
                if let (Some(key), CheckoutError::Db(db_err)) = (idempotency_key, &err) {
                    if db_err.is_unique_violation_on("sales.idempotency_key") {
                        if let Some(sale) = self.sales().get_by_idempotency_key(key).await? {
                            info!(sale_id = %sale.id, "Duplicate submission, replaying original sale");
                            return Ok(self.sales().expect_detail(&sale.id).await?);
                        }
                    }
                }

                Err(err)
            }
        }
    }

    /// Finalises a confirmed UPI intent into a sale, exactly once.
    ///
    /// Runs the guarded received→finalised transition and the sale creation
    /// in one transaction, then stamps the created sale's id onto the
    /// intent.
    ///
    /// ## Failure
    /// * `PaymentNotFound` - no such intent
    /// * `PaymentNotConfirmed` - still pending (422 at the API)
    /// * `PaymentAlreadyFinalised` - a sale already exists for this intent
    /// * any `create_sale` failure - everything rolls back and the intent
    ///   stays `received`, so the operator can retry after fixing the cause
    pub async fn finalise_payment(&self, intent_id: &str) -> CheckoutResult<SaleDetail> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let result = Self::finalise_in_tx(&mut tx, intent_id, now).await;

        match result {
            Ok(sale) => {
                tx.commit().await.map_err(DbError::from)?;
                info!(intent_id = %intent_id, sale_id = %sale.id, "Payment finalised");
                Ok(self.sales().expect_detail(&sale.id).await?)
            }
            Err(err) => {
                if let Err(rb_err) = tx.rollback().await {
                    warn!(error = %rb_err, "Rollback after failed finalise also failed");
                }
                Err(err)
            }
        }
    }

    /// The body of the sale transaction, on the caller's connection.
    async fn create_sale_in_tx(
        conn: &mut SqliteConnection,
        cart: &Cart,
        idempotency_key: Option<&str>,
        now: chrono::DateTime<Utc>,
    ) -> CheckoutResult<Sale> {
        let sale = Sale {
            id: generate_sale_id(),
            customer_name: cart.customer.name.clone(),
            customer_phone: cart.customer.phone.clone(),
            vehicle_details: cart.customer.vehicle_details.clone(),
            installation_address: cart.customer.installation_address.clone(),
            product_category: cart.customer.product_category.clone(),
            sale_type: cart.sale_type,
            total_paise: cart.total_paise,
            extra_charges_paise: cart.extra_charges_paise,
            discount_paise: cart.discount_paise,
            payment_method: cart.payment_method,
            exchange_record_id: cart.exchange_record_id.clone(),
            idempotency_key: idempotency_key.map(str::to_string),
            created_at: now,
        };

        SaleRepository::insert_sale_in_tx(conn, &sale).await?;

        if let Some(exchange_id) = &cart.exchange_record_id {
            ExchangeRepository::consume_in_tx(conn, exchange_id).await?;
        }

        for line in &cart.lines {
            let (product_id, service_id) = match line {
                CartLine::Product {
                    product_id,
                    quantity,
                    ..
                } => {
                    ProductRepository::reserve_stock_in_tx(conn, product_id, *quantity).await?;
                    (Some(product_id.clone()), None)
                }
                CartLine::Service { service_id, .. } => {
                    ServiceRepository::ensure_exists_in_tx(conn, service_id).await?;
                    (None, Some(service_id.clone()))
                }
            };

            let item = SaleItem {
                id: generate_sale_item_id(),
                sale_id: sale.id.clone(),
                product_id,
                service_id,
                quantity: line.quantity(),
                unit_price_paise: line.unit_price().paise(),
                created_at: now,
            };
            SaleRepository::insert_item_in_tx(conn, &item).await?;
        }

        Ok(sale)
    }

    /// The body of the finalise transaction, on the caller's connection.
    async fn finalise_in_tx(
        conn: &mut SqliteConnection,
        intent_id: &str,
        now: chrono::DateTime<Utc>,
    ) -> CheckoutResult<Sale> {
        let result = sqlx::query(
            r#"
            UPDATE upi_payments
            SET status = 'finalised', updated_at = ?2
            WHERE id = ?1 AND status = 'received'
            "#,
        )
        .bind(intent_id)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            let status: Option<PaymentStatus> =
                sqlx::query_scalar("SELECT status FROM upi_payments WHERE id = ?1")
                    .bind(intent_id)
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(DbError::from)?;

            return match status {
                None => Err(CoreError::PaymentNotFound(intent_id.to_string()).into()),
                Some(PaymentStatus::Finalised) => Err(CoreError::PaymentAlreadyFinalised {
                    id: intent_id.to_string(),
                }
                .into()),
                Some(status) => Err(CoreError::PaymentNotConfirmed {
                    id: intent_id.to_string(),
                    status: status.as_str().to_string(),
                }
                .into()),
            };
        }

        let sale_data: String =
            sqlx::query_scalar("SELECT sale_data FROM upi_payments WHERE id = ?1")
                .bind(intent_id)
                .fetch_one(&mut *conn)
                .await
                .map_err(DbError::from)?;

        // Validated at intent creation; a decode failure here means the
        // stored row was tampered with or predates the schema.
        let cart: Cart = serde_json::from_str(&sale_data).map_err(|e| DbError::CorruptPayload {
            entity: "Payment".to_string(),
            id: intent_id.to_string(),
            message: e.to_string(),
        })?;
        cart.validate().map_err(CoreError::Validation)?;

        let idempotency_key = format!("upi:{intent_id}");
        let sale = Self::create_sale_in_tx(conn, &cart, Some(&idempotency_key), now).await?;

        sqlx::query("UPDATE upi_payments SET sale_id = ?2 WHERE id = ?1")
            .bind(intent_id)
            .bind(&sale.id)
            .execute(&mut *conn)
            .await
            .map_err(DbError::from)?;

        Ok(sale)
    }
}

// =============================================================================
// Counting helpers shared with tests
// =============================================================================

/// Counts sale items across all sales (diagnostics and tests).
pub async fn count_sale_items(pool: &SqlitePool) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use volt_core::{
        CartDraft, CartLineDraft, ExchangeRecord, ExchangeStatus, PaymentMethod, Product,
        ServiceJob, ServiceStatus,
    };

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, stock: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: uuid::Uuid::new_v4().to_string(),
            brand: "Exide".to_string(),
            model: "Mileage ML38B20L".to_string(),
            battery_type: "Car".to_string(),
            capacity_ah: "35Ah".to_string(),
            price_paise: 10000,
            stock,
            min_stock: 2,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product
    }

    async fn seed_service(db: &Database) -> ServiceJob {
        let now = Utc::now();
        let service = ServiceJob {
            id: uuid::Uuid::new_v4().to_string(),
            customer_name: "Ravi Kumar".to_string(),
            contact_number: "9876543210".to_string(),
            vehicle_details: "Maruti Swift KA-01-AB-1234".to_string(),
            status: ServiceStatus::Completed,
            service_charge_paise: 25000,
            battery_brand: Some("Exide".to_string()),
            battery_model: None,
            pickup_date: None,
            created_at: now,
            updated_at: now,
        };
        db.services().insert(&service).await.unwrap();
        service
    }

    async fn seed_exchange(db: &Database) -> ExchangeRecord {
        let now = Utc::now();
        let record = ExchangeRecord {
            id: uuid::Uuid::new_v4().to_string(),
            customer_name: "Ravi Kumar".to_string(),
            customer_phone: None,
            customer_address: None,
            battery_brand: "Amaron".to_string(),
            battery_model: None,
            valuation_paise: 50000,
            status: ExchangeStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        db.exchanges().insert(&record).await.unwrap();
        record
    }

    fn product_cart(product_id: &str, quantity: i64, unit_price_paise: i64) -> volt_core::Cart {
        CartDraft {
            customer_name: "Ravi Kumar".to_string(),
            customer_phone: Some("9876543210".to_string()),
            vehicle_details: None,
            installation_address: None,
            product_category: None,
            sale_type: None,
            items: vec![CartLineDraft {
                product_id: Some(product_id.to_string()),
                service_id: None,
                quantity,
                unit_price_paise,
            }],
            total_paise: unit_price_paise * quantity,
            extra_charges_paise: None,
            discount_paise: None,
            exchange_record_id: None,
            payment_method: None,
        }
        .into_cart()
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_sale_decrements_stock_and_persists_items() {
        let db = test_db().await;
        let product = seed_product(&db, 5).await;

        let cart = product_cart(&product.id, 3, 10000);
        let detail = db.checkout().create_sale(&cart, None).await.unwrap();

        assert_eq!(detail.sale.total_paise, 30000);
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].item.quantity, 3);
        assert_eq!(
            detail.items[0].product.as_ref().unwrap().brand,
            "Exide"
        );

        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 2);
        assert_eq!(db.sales().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_sale_insufficient_stock_changes_nothing() {
        let db = test_db().await;
        let product = seed_product(&db, 5).await;

        // First sale takes 3, leaving 2.
        let cart = product_cart(&product.id, 3, 10000);
        db.checkout().create_sale(&cart, None).await.unwrap();

        // Asking for 10 now must fail and leave the 2 alone.
        let cart = product_cart(&product.id, 10, 10000);
        let err = db.checkout().create_sale(&cart, None).await.unwrap_err();
        match err {
            CheckoutError::Core(CoreError::InsufficientStock {
                brand,
                available,
                requested,
                ..
            }) => {
                assert_eq!(brand, "Exide");
                assert_eq!(available, 2);
                assert_eq!(requested, 10);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 2);
        assert_eq!(db.sales().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_sale_is_atomic_across_lines() {
        let db = test_db().await;
        let good = seed_product(&db, 10).await;
        let scarce = seed_product(&db, 1).await;

        let cart = CartDraft {
            customer_name: "Ravi Kumar".to_string(),
            customer_phone: None,
            vehicle_details: None,
            installation_address: None,
            product_category: None,
            sale_type: None,
            items: vec![
                CartLineDraft {
                    product_id: Some(good.id.clone()),
                    service_id: None,
                    quantity: 2,
                    unit_price_paise: 10000,
                },
                CartLineDraft {
                    product_id: Some(scarce.id.clone()),
                    service_id: None,
                    quantity: 5,
                    unit_price_paise: 10000,
                },
            ],
            total_paise: 70000,
            extra_charges_paise: None,
            discount_paise: None,
            exchange_record_id: None,
            payment_method: None,
        }
        .into_cart()
        .unwrap();

        let err = db.checkout().create_sale(&cart, None).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::InsufficientStock { .. })
        ));

        // Nothing survives: no sale, no items, and the first line's
        // decrement was rolled back.
        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert_eq!(count_sale_items(db.pool()).await.unwrap(), 0);
        let good_after = db.products().get_by_id(&good.id).await.unwrap().unwrap();
        assert_eq!(good_after.stock, 10);
    }

    #[tokio::test]
    async fn test_create_sale_unknown_product() {
        let db = test_db().await;

        let cart = product_cart("no-such-product", 1, 10000);
        let err = db.checkout().create_sale(&cart, None).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::ProductNotFound(_))
        ));
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_sale_with_service_line() {
        let db = test_db().await;
        let service = seed_service(&db).await;

        let cart = CartDraft {
            customer_name: "Ravi Kumar".to_string(),
            customer_phone: None,
            vehicle_details: None,
            installation_address: None,
            product_category: None,
            sale_type: None,
            items: vec![CartLineDraft {
                product_id: None,
                service_id: Some(service.id.clone()),
                quantity: 1,
                unit_price_paise: 25000,
            }],
            total_paise: 25000,
            extra_charges_paise: None,
            discount_paise: None,
            exchange_record_id: None,
            payment_method: None,
        }
        .into_cart()
        .unwrap();

        let detail = db.checkout().create_sale(&cart, None).await.unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(
            detail.items[0].service.as_ref().unwrap().customer_name,
            "Ravi Kumar"
        );
        assert!(detail.items[0].product.is_none());
    }

    #[tokio::test]
    async fn test_create_sale_unknown_service() {
        let db = test_db().await;

        let cart = CartDraft {
            customer_name: "Ravi Kumar".to_string(),
            customer_phone: None,
            vehicle_details: None,
            installation_address: None,
            product_category: None,
            sale_type: None,
            items: vec![CartLineDraft {
                product_id: None,
                service_id: Some("no-such-service".to_string()),
                quantity: 1,
                unit_price_paise: 25000,
            }],
            total_paise: 25000,
            extra_charges_paise: None,
            discount_paise: None,
            exchange_record_id: None,
            payment_method: None,
        }
        .into_cart()
        .unwrap();

        let err = db.checkout().create_sale(&cart, None).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::ServiceNotFound(_))
        ));
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_exchange_credit_single_use() {
        let db = test_db().await;
        let product = seed_product(&db, 10).await;
        let credit = seed_exchange(&db).await;

        let mut cart = product_cart(&product.id, 1, 10000);
        cart.exchange_record_id = Some(credit.id.clone());
        cart.discount_paise = credit.valuation_paise;

        db.checkout().create_sale(&cart, None).await.unwrap();

        let consumed = db.exchanges().get_by_id(&credit.id).await.unwrap().unwrap();
        assert_eq!(consumed.status, ExchangeStatus::Consumed);

        // Second sale referencing the same credit must fail outright.
        let mut cart2 = product_cart(&product.id, 1, 10000);
        cart2.exchange_record_id = Some(credit.id.clone());
        let err = db.checkout().create_sale(&cart2, None).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::ExchangeAlreadyConsumed { .. })
        ));

        // First sale untouched, no second sale, stock decremented once.
        assert_eq!(db.sales().count().await.unwrap(), 1);
        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 9);
    }

    #[tokio::test]
    async fn test_create_sale_idempotency_replay() {
        let db = test_db().await;
        let product = seed_product(&db, 5).await;

        let cart = product_cart(&product.id, 2, 10000);
        let first = db
            .checkout()
            .create_sale(&cart, Some("pos-1-txn-42"))
            .await
            .unwrap();
        let second = db
            .checkout()
            .create_sale(&cart, Some("pos-1-txn-42"))
            .await
            .unwrap();

        assert_eq!(first.sale.id, second.sale.id);
        assert_eq!(db.sales().count().await.unwrap(), 1);

        // Stock only moved once.
        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 3);
    }

    #[tokio::test]
    async fn test_create_sale_rejects_empty_cart() {
        let db = test_db().await;

        let mut cart = product_cart("p", 1, 100);
        cart.lines.clear();

        let err = db.checkout().create_sale(&cart, None).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_upi_flow_create_confirm_finalise() {
        let db = test_db().await;
        let product = seed_product(&db, 5).await;

        let mut cart = product_cart(&product.id, 2, 59000);
        cart.payment_method = PaymentMethod::Upi;

        let intent = db.payments().create(118000, &cart, None).await.unwrap();
        assert_eq!(intent.status, PaymentStatus::Pending);
        assert_eq!(
            db.payments().status(&intent.id).await.unwrap(),
            Some(PaymentStatus::Pending)
        );

        let status = db
            .payments()
            .confirm(&intent.id, Some("UPI-REF-123"))
            .await
            .unwrap();
        assert_eq!(status, PaymentStatus::Received);

        let detail = db.checkout().finalise_payment(&intent.id).await.unwrap();
        assert_eq!(detail.sale.total_paise, 118000);
        assert_eq!(detail.sale.payment_method, PaymentMethod::Upi);

        let after = db.payments().get_by_id(&intent.id).await.unwrap().unwrap();
        assert_eq!(after.status, PaymentStatus::Finalised);
        assert_eq!(after.sale_id.as_deref(), Some(detail.sale.id.as_str()));
        assert_eq!(after.upi_ref.as_deref(), Some("UPI-REF-123"));

        let stocked = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stocked.stock, 3);
    }

    #[tokio::test]
    async fn test_confirm_twice_is_rejected() {
        let db = test_db().await;
        let product = seed_product(&db, 5).await;
        let cart = product_cart(&product.id, 1, 59000);

        let intent = db.payments().create(59000, &cart, None).await.unwrap();
        db.payments().confirm(&intent.id, None).await.unwrap();

        let err = db.payments().confirm(&intent.id, None).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::PaymentAlreadyProcessed { .. })
        ));
    }

    #[tokio::test]
    async fn test_finalise_before_confirm_is_rejected() {
        let db = test_db().await;
        let product = seed_product(&db, 5).await;
        let cart = product_cart(&product.id, 1, 59000);

        let intent = db.payments().create(59000, &cart, None).await.unwrap();

        let err = db.checkout().finalise_payment(&intent.id).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::PaymentNotConfirmed { .. })
        ));
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_finalise_twice_creates_one_sale() {
        let db = test_db().await;
        let product = seed_product(&db, 5).await;
        let cart = product_cart(&product.id, 1, 59000);

        let intent = db.payments().create(59000, &cart, None).await.unwrap();
        db.payments().confirm(&intent.id, None).await.unwrap();
        db.checkout().finalise_payment(&intent.id).await.unwrap();

        let err = db.checkout().finalise_payment(&intent.id).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::PaymentAlreadyFinalised { .. })
        ));

        assert_eq!(db.sales().count().await.unwrap(), 1);
        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 4);
    }

    #[tokio::test]
    async fn test_finalise_failure_leaves_intent_retryable() {
        let db = test_db().await;
        let product = seed_product(&db, 2).await;

        // Cart wants more than is on the shelf.
        let cart = product_cart(&product.id, 10, 59000);
        let intent = db.payments().create(590000, &cart, None).await.unwrap();
        db.payments().confirm(&intent.id, None).await.unwrap();

        let err = db.checkout().finalise_payment(&intent.id).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::InsufficientStock { .. })
        ));

        // Intent rolled back to received (not finalised, not pending),
        // no sale exists.
        let after = db.payments().get_by_id(&intent.id).await.unwrap().unwrap();
        assert_eq!(after.status, PaymentStatus::Received);
        assert!(after.sale_id.is_none());
        assert_eq!(db.sales().count().await.unwrap(), 0);

        // Restock and retry the same intent: now it goes through.
        let mut restocked = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        restocked.stock = 10;
        db.products().update(&restocked).await.unwrap();

        let detail = db.checkout().finalise_payment(&intent.id).await.unwrap();
        assert_eq!(detail.sale.total_paise, 590000);
        assert_eq!(db.sales().count().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_never_oversell() {
        // In-memory SQLite is single-connection; real contention needs a
        // file-backed pool.
        let path = std::env::temp_dir().join(format!("voltpos-test-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4))
            .await
            .unwrap();

        let product = seed_product(&db, 5).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let checkout = db.checkout();
            let cart = product_cart(&product.id, 1, 10000);
            handles.push(tokio::spawn(async move {
                checkout.create_sale(&cart, None).await
            }));
        }

        let mut successes = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(CheckoutError::Core(CoreError::InsufficientStock { .. })) => conflicts += 1,
                Err(other) => panic!("unexpected checkout error: {other:?}"),
            }
        }

        assert_eq!(successes, 5);
        assert_eq!(conflicts, 5);

        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 0);
        assert_eq!(db.sales().count().await.unwrap(), 5);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
