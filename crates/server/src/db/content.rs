//! Generic repository for CMS content tables.
//!
//! Every content kind shares the same query shapes; only the table name and
//! the entity-specific columns differ, and those come from
//! [`ContentEntity`]. Values are always bound, never interpolated.

use std::marker::PhantomData;

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::RepositoryError;
use crate::models::content::{ColumnValue, ContentEntity};

/// Repository for one content table.
pub struct ContentRepository<'a, T> {
    pool: &'a PgPool,
    _entity: PhantomData<T>,
}

impl<'a, T: ContentEntity> ContentRepository<'a, T> {
    /// Create a new content repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    /// List rows by display order, then creation time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, active_only: bool) -> Result<Vec<T>, RepositoryError> {
        let filter = if active_only { "WHERE is_active" } else { "" };
        let rows = sqlx::query_as::<_, T>(&format!(
            "SELECT * FROM {} {filter} ORDER BY display_order ASC, created_at ASC",
            T::TABLE
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Get one row by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row has this ID.
    pub async fn get(&self, id: Uuid) -> Result<T, RepositoryError> {
        sqlx::query_as::<_, T>(&format!("SELECT * FROM {} WHERE id = $1", T::TABLE))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Insert a new row with a fresh UUID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a unique violation.
    pub async fn create(
        &self,
        columns: Vec<(&'static str, ColumnValue)>,
        display_order: i32,
        is_active: bool,
    ) -> Result<T, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} (id, display_order, is_active",
            T::TABLE
        ));
        for (name, _) in &columns {
            qb.push(", ").push(*name);
        }
        qb.push(") VALUES (");
        {
            let mut values = qb.separated(", ");
            values.push_bind(Uuid::new_v4());
            values.push_bind(display_order);
            values.push_bind(is_active);
        }
        for (_, value) in columns {
            qb.push(", ");
            push_value(&mut qb, value);
        }
        qb.push(") RETURNING *");

        qb.build_query_as::<T>()
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::unique_violation(e, &already_exists::<T>()))
    }

    /// Replace the entity-specific columns of a row.
    ///
    /// `display_order` and `is_active` keep their stored values when `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row has this ID.
    pub async fn update(
        &self,
        id: Uuid,
        columns: Vec<(&'static str, ColumnValue)>,
        display_order: Option<i32>,
        is_active: Option<bool>,
    ) -> Result<T, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "UPDATE {} SET display_order = COALESCE(",
            T::TABLE
        ));
        qb.push_bind(display_order)
            .push(", display_order), is_active = COALESCE(")
            .push_bind(is_active)
            .push(", is_active)");
        for (name, value) in columns {
            qb.push(", ").push(name).push(" = ");
            push_value(&mut qb, value);
        }
        qb.push(", updated_at = NOW() WHERE id = ")
            .push_bind(id)
            .push(" RETURNING *");

        qb.build_query_as::<T>()
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::unique_violation(e, &already_exists::<T>()))?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete a row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row has this ID.
    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", T::TABLE))
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete every row, returning how many went.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query(&format!("DELETE FROM {}", T::TABLE))
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Count rows, for the admin dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", T::TABLE))
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

fn already_exists<T: ContentEntity>() -> String {
    format!("{} already exists", T::NAME)
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: ColumnValue) {
    match value {
        ColumnValue::Text(v) => qb.push_bind(v),
        ColumnValue::OptText(v) => qb.push_bind(v),
        ColumnValue::Decimal(v) => qb.push_bind(v),
        ColumnValue::Bool(v) => qb.push_bind(v),
        ColumnValue::TextList(v) => qb.push_bind(v),
    };
}
