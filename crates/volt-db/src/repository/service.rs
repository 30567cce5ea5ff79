//! # Service Repository
//!
//! Database operations for battery service jobs.
//!
//! A job moves pending → in_progress → completed via staff updates; once
//! completed it can be billed onto a sale as a service line.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::checkout::CheckoutError;
use crate::error::{DbError, DbResult};
use volt_core::{CoreError, ServiceJob};

/// Repository for service-job database operations.
#[derive(Debug, Clone)]
pub struct ServiceRepository {
    pool: SqlitePool,
}

impl ServiceRepository {
    /// Creates a new ServiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ServiceRepository { pool }
    }

    /// Lists all service jobs, newest first.
    pub async fn list(&self) -> DbResult<Vec<ServiceJob>> {
        let services = sqlx::query_as::<_, ServiceJob>(
            r#"
            SELECT id, customer_name, contact_number, vehicle_details, status,
                   service_charge_paise, battery_brand, battery_model,
                   pickup_date, created_at, updated_at
            FROM services
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    /// Gets a service job by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ServiceJob>> {
        let service = sqlx::query_as::<_, ServiceJob>(
            r#"
            SELECT id, customer_name, contact_number, vehicle_details, status,
                   service_charge_paise, battery_brand, battery_model,
                   pickup_date, created_at, updated_at
            FROM services
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    /// Inserts a new service job.
    pub async fn insert(&self, service: &ServiceJob) -> DbResult<()> {
        debug!(id = %service.id, customer = %service.customer_name, "Inserting service job");

        sqlx::query(
            r#"
            INSERT INTO services (
                id, customer_name, contact_number, vehicle_details, status,
                service_charge_paise, battery_brand, battery_model,
                pickup_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&service.id)
        .bind(&service.customer_name)
        .bind(&service.contact_number)
        .bind(&service.vehicle_details)
        .bind(service.status)
        .bind(service.service_charge_paise)
        .bind(&service.battery_brand)
        .bind(&service.battery_model)
        .bind(service.pickup_date)
        .bind(service.created_at)
        .bind(service.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing service job (details or status transition).
    pub async fn update(&self, service: &ServiceJob) -> DbResult<()> {
        debug!(id = %service.id, status = ?service.status, "Updating service job");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE services SET
                customer_name = ?2,
                contact_number = ?3,
                vehicle_details = ?4,
                status = ?5,
                service_charge_paise = ?6,
                battery_brand = ?7,
                battery_model = ?8,
                pickup_date = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&service.id)
        .bind(&service.customer_name)
        .bind(&service.contact_number)
        .bind(&service.vehicle_details)
        .bind(service.status)
        .bind(service.service_charge_paise)
        .bind(&service.battery_brand)
        .bind(&service.battery_model)
        .bind(service.pickup_date)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", &service.id));
        }

        Ok(())
    }

    /// Deletes a service job.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting service job");

        let result = sqlx::query("DELETE FROM services WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", id));
        }

        Ok(())
    }

    /// Verifies a service id exists, inside the caller's transaction.
    ///
    /// The checkout engine calls this for every service line so a sale
    /// can't reference a job that was deleted after the cart was built.
    pub(crate) async fn ensure_exists_in_tx(
        conn: &mut SqliteConnection,
        service_id: &str,
    ) -> Result<(), CheckoutError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM services WHERE id = ?1")
            .bind(service_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(DbError::from)?;

        if found.is_none() {
            return Err(CoreError::ServiceNotFound(service_id.to_string()).into());
        }

        Ok(())
    }
}

/// Helper to generate a new service job ID.
pub fn generate_service_id() -> String {
    Uuid::new_v4().to_string()
}
