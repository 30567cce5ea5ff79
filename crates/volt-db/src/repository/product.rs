//! # Product Repository
//!
//! Database operations for products (batteries).
//!
//! ## Key Operations
//! - CRUD for the admin inventory screens
//! - `reserve_stock_in_tx`: the guarded decrement the checkout engine runs
//!   inside its sale transaction
//!
//! ## Guarded Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Why one UPDATE instead of read-then-write                  │
//! │                                                                         │
//! │  ❌ WRONG: read stock, compare, then write                              │
//! │     Two counters can both read stock=1 and both "succeed".              │
//! │                                                                         │
//! │  ✅ CORRECT: single conditional statement                               │
//! │     UPDATE products SET stock = stock - ?q                              │
//! │     WHERE id = ?id AND stock >= ?q                                      │
//! │                                                                         │
//! │  The statement runs under the database write lock, so concurrent        │
//! │  sales of the same battery serialize; the loser affects zero rows       │
//! │  and the caller reports insufficient stock.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::checkout::CheckoutError;
use crate::error::{DbError, DbResult};
use volt_core::{CoreError, Product};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists all products, ordered by brand then model.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, brand, model, battery_type, capacity_ah,
                   price_paise, stock, min_stock, created_at, updated_at
            FROM products
            ORDER BY brand, model
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists products at or below their minimum stock threshold.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, brand, model, battery_type, capacity_ah,
                   price_paise, stock, min_stock, created_at, updated_at
            FROM products
            WHERE stock <= min_stock
            ORDER BY brand, model
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, brand, model, battery_type, capacity_ah,
                   price_paise, stock, min_stock, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(brand = %product.brand, model = %product.model, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, brand, model, battery_type, capacity_ah,
                price_paise, stock, min_stock, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.brand)
        .bind(&product.model)
        .bind(&product.battery_type)
        .bind(&product.capacity_ah)
        .bind(product.price_paise)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product (administrative edit, including stock
    /// corrections).
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                brand = ?2,
                model = ?3,
                battery_type = ?4,
                capacity_ah = ?5,
                price_paise = ?6,
                stock = ?7,
                min_stock = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.brand)
        .bind(&product.model)
        .bind(&product.battery_type)
        .bind(&product.capacity_ah)
        .bind(product.price_paise)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Deletes a product.
    ///
    /// Historical sale items keep their product_id reference; deleting a
    /// product that appears on a sale fails the foreign key check.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Decrements stock for one sale line, inside the caller's transaction.
    ///
    /// ## Failure
    /// * `CoreError::ProductNotFound` - no such product id
    /// * `CoreError::InsufficientStock` - stock < quantity; names brand and
    ///   model so the counter operator knows which battery ran out
    ///
    /// Zero rows affected cannot distinguish the two, so the follow-up
    /// SELECT (still inside the transaction, lock already held) decides.
    pub(crate) async fn reserve_stock_in_tx(
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> Result<(), CheckoutError> {
        debug!(product_id = %product_id, quantity = %quantity, "Reserving stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?2, updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            let product = sqlx::query_as::<_, Product>(
                r#"
                SELECT id, brand, model, battery_type, capacity_ah,
                       price_paise, stock, min_stock, created_at, updated_at
                FROM products
                WHERE id = ?1
                "#,
            )
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(DbError::from)?;

            return match product {
                None => Err(CoreError::ProductNotFound(product_id.to_string()).into()),
                Some(p) => Err(CoreError::InsufficientStock {
                    brand: p.brand,
                    model: p.model,
                    available: p.stock,
                    requested: quantity,
                }
                .into()),
            };
        }

        Ok(())
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
