//! # Sale Repository
//!
//! Read access to the sales ledger, plus the in-transaction inserts the
//! checkout engine uses.
//!
//! Sales are append-only: the only write path is the checkout engine's
//! transaction. There is no update or delete here on purpose.

use sqlx::{SqliteConnection, SqlitePool};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use volt_core::{Product, Sale, SaleItem, ServiceJob};

// =============================================================================
// Resolved Sale Shapes
// =============================================================================

/// A sale line with its product or service resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct SaleItemDetail {
    #[serde(flatten)]
    pub item: SaleItem,
    pub product: Option<Product>,
    pub service: Option<ServiceJob>,
}

/// A sale with all line items resolved.
#[derive(Debug, Clone, Serialize)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItemDetail>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Lists all sales with resolved items, newest first.
    pub async fn list(&self) -> DbResult<Vec<SaleDetail>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, customer_name, customer_phone, vehicle_details,
                   installation_address, product_category, sale_type,
                   total_paise, extra_charges_paise, discount_paise,
                   payment_method, exchange_record_id, idempotency_key,
                   created_at
            FROM sales
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut details = Vec::with_capacity(sales.len());
        for sale in sales {
            let items = self.resolve_items(&sale.id).await?;
            details.push(SaleDetail { sale, items });
        }

        Ok(details)
    }

    /// Gets a sale with resolved items.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<SaleDetail>> {
        let sale = self.get_by_id(id).await?;

        match sale {
            None => Ok(None),
            Some(sale) => {
                let items = self.resolve_items(&sale.id).await?;
                Ok(Some(SaleDetail { sale, items }))
            }
        }
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, customer_name, customer_phone, vehicle_details,
                   installation_address, product_category, sale_type,
                   total_paise, extra_charges_paise, discount_paise,
                   payment_method, exchange_record_id, idempotency_key,
                   created_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale header by its replay-protection key.
    ///
    /// Used to answer a retried submission with the original sale.
    pub async fn get_by_idempotency_key(&self, key: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, customer_name, customer_phone, vehicle_details,
                   installation_address, product_category, sale_type,
                   total_paise, extra_charges_paise, discount_paise,
                   payment_method, exchange_record_id, idempotency_key,
                   created_at
            FROM sales
            WHERE idempotency_key = ?1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all items for a sale, in submission order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, service_id, quantity,
                   unit_price_paise, created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Loads items and attaches their product/service rows.
    async fn resolve_items(&self, sale_id: &str) -> DbResult<Vec<SaleItemDetail>> {
        let items = self.get_items(sale_id).await?;

        let mut resolved = Vec::with_capacity(items.len());
        for item in items {
            let product = match &item.product_id {
                Some(product_id) => {
                    sqlx::query_as::<_, Product>(
                        r#"
                        SELECT id, brand, model, battery_type, capacity_ah,
                               price_paise, stock, min_stock, created_at, updated_at
                        FROM products
                        WHERE id = ?1
                        "#,
                    )
                    .bind(product_id)
                    .fetch_optional(&self.pool)
                    .await?
                }
                None => None,
            };

            let service = match &item.service_id {
                Some(service_id) => {
                    sqlx::query_as::<_, ServiceJob>(
                        r#"
                        SELECT id, customer_name, contact_number, vehicle_details,
                               status, service_charge_paise, battery_brand,
                               battery_model, pickup_date, created_at, updated_at
                        FROM services
                        WHERE id = ?1
                        "#,
                    )
                    .bind(service_id)
                    .fetch_optional(&self.pool)
                    .await?
                }
                None => None,
            };

            resolved.push(SaleItemDetail {
                item,
                product,
                service,
            });
        }

        Ok(resolved)
    }

    /// Counts sales (for diagnostics and tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Inserts a sale header, inside the caller's transaction.
    pub(crate) async fn insert_sale_in_tx(
        conn: &mut SqliteConnection,
        sale: &Sale,
    ) -> DbResult<()> {
        debug!(id = %sale.id, total = %sale.total_paise, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, customer_name, customer_phone, vehicle_details,
                installation_address, product_category, sale_type,
                total_paise, extra_charges_paise, discount_paise,
                payment_method, exchange_record_id, idempotency_key,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_name)
        .bind(&sale.customer_phone)
        .bind(&sale.vehicle_details)
        .bind(&sale.installation_address)
        .bind(&sale.product_category)
        .bind(sale.sale_type)
        .bind(sale.total_paise)
        .bind(sale.extra_charges_paise)
        .bind(sale.discount_paise)
        .bind(sale.payment_method)
        .bind(&sale.exchange_record_id)
        .bind(&sale.idempotency_key)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts one sale line, inside the caller's transaction.
    pub(crate) async fn insert_item_in_tx(
        conn: &mut SqliteConnection,
        item: &SaleItem,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, service_id, quantity,
                unit_price_paise, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.service_id)
        .bind(item.quantity)
        .bind(item.unit_price_paise)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Fetches a sale detail, failing if it vanished (used right after a
    /// successful commit).
    pub(crate) async fn expect_detail(&self, id: &str) -> DbResult<SaleDetail> {
        self.get_detail(id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))
    }
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new sale item ID.
pub fn generate_sale_item_id() -> String {
    Uuid::new_v4().to_string()
}
