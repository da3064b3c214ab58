//! Order repository.
//!
//! Order numbers are allocated inside the inserting transaction while holding
//! a transaction-scoped advisory lock; `orders.id` is the primary key, so even
//! a bypassed lock cannot produce a duplicate.

use sqlx::PgPool;

use mff_core::{OrderNumber, OrderStatus, UserId};

use super::RepositoryError;
use crate::models::Order;
use crate::models::order::ValidOrderDetails;

const ORDER_COLUMNS: &str = "id, user_id, service_plan, plan_price, deceased_name, \
     deceased_date_of_birth, deceased_date_of_death, director_name, director_email, \
     director_phone, special_requests, status, service_date, created_at, updated_at";

/// Advisory lock key serialising order-number allocation.
const ORDER_NUMBER_LOCK_KEY: i64 = 0x4d46_464f_5244; // "MFFORD"

/// Repository for order operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order with the next sequential number.
    ///
    /// `owner` is `None` for orders placed before the customer has an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn create(
        &self,
        owner: Option<UserId>,
        details: &ValidOrderDetails,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ORDER_NUMBER_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        // Longer ids sort after shorter ones once the sequence passes 9999
        let latest: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM mff.orders ORDER BY length(id) DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&mut *tx)
        .await?;
        let id = OrderNumber::next_after(latest.as_ref().map(|(id,)| id.as_str()));

        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO mff.orders (
                id, user_id, service_plan, plan_price, deceased_name,
                deceased_date_of_birth, deceased_date_of_death, director_name,
                director_email, director_phone, special_requests, service_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(&id)
        .bind(owner)
        .bind(&details.service_plan)
        .bind(details.plan_price)
        .bind(&details.deceased_name)
        .bind(details.deceased_date_of_birth)
        .bind(details.deceased_date_of_death)
        .bind(&details.director_name)
        .bind(&details.director_email)
        .bind(&details.director_phone)
        .bind(&details.special_requests)
        .bind(details.service_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "order number already issued"))?;

        tx.commit().await?;

        tracing::info!(order_id = %order.id, claimed = owner.is_some(), "Order created");
        Ok(order)
    }

    /// Get an order by its number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: &OrderNumber) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM mff.orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// List a customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM mff.orders WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// List every order, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM mff.orders \
             WHERE ($1::mff.order_status IS NULL OR status = $1) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Replace the customer-editable fields of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_details(
        &self,
        id: &OrderNumber,
        details: &ValidOrderDetails,
    ) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE mff.orders SET
                service_plan = $2, plan_price = $3, deceased_name = $4,
                deceased_date_of_birth = $5, deceased_date_of_death = $6,
                director_name = $7, director_email = $8, director_phone = $9,
                special_requests = $10, service_date = $11, updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&details.service_plan)
        .bind(details.plan_price)
        .bind(&details.deceased_name)
        .bind(details.deceased_date_of_birth)
        .bind(details.deceased_date_of_death)
        .bind(&details.director_name)
        .bind(&details.director_email)
        .bind(&details.director_phone)
        .bind(&details.special_requests)
        .bind(details.service_date)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Set an order's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_status(
        &self,
        id: &OrderNumber,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, Order>(&format!(
            "UPDATE mff.orders SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Assign an unclaimed order to `user`.
    ///
    /// Returns `false` if the order does not exist or already has an owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn claim(&self, id: &OrderNumber, user: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE mff.orders SET user_id = $2, updated_at = NOW() \
             WHERE id = $1 AND user_id IS NULL",
        )
        .bind(id)
        .bind(user)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete an order and its form progress as one unit.
    ///
    /// A missing progress record is fine; a missing order rolls the whole
    /// transaction back and reports `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn delete(&self, id: &OrderNumber) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM mff.form_progress WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM mff.orders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        tracing::info!(order_id = %id, "Order deleted");
        Ok(())
    }

    /// Count orders, for the admin dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM mff.orders")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
