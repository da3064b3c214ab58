//! Form-progress repository.
//!
//! Each order has at most one progress document. Merges lock the row for the
//! duration of the read-modify-write, so concurrent saves for the same order
//! apply one after the other instead of overwriting each other.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;

use mff_core::{FormProgress, OrderNumber};

use super::RepositoryError;

/// A stored progress document with its revision counter.
#[derive(Debug, Clone)]
pub struct FormProgressRecord {
    pub data: FormProgress,
    /// Incremented on every write; `0` means nothing has been saved yet.
    pub revision: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl FormProgressRecord {
    /// The record reported for an order that has no saved progress.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            data: FormProgress::new(),
            revision: 0,
            updated_at: None,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProgressRow {
    data: Json<FormProgress>,
    revision: i64,
    updated_at: DateTime<Utc>,
}

impl From<ProgressRow> for FormProgressRecord {
    fn from(row: ProgressRow) -> Self {
        Self {
            data: row.data.0,
            revision: row.revision,
            updated_at: Some(row.updated_at),
        }
    }
}

/// Repository for form-progress operations.
pub struct FormProgressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FormProgressRepository<'a> {
    /// Create a new form-progress repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load the progress document for an order.
    ///
    /// Returns [`FormProgressRecord::empty`] when nothing has been saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, order_id: &OrderNumber) -> Result<FormProgressRecord, RepositoryError> {
        let row = sqlx::query_as::<_, ProgressRow>(
            "SELECT data, revision, updated_at FROM mff.form_progress WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map_or_else(FormProgressRecord::empty, Into::into))
    }

    /// Save one step into an order's progress document.
    ///
    /// Preference steps replace each other (see [`FormProgress::set_step`]).
    /// When `expected_revision` is given it must equal the stored revision.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a revision mismatch,
    /// `RepositoryError::NotFound` if the order does not exist.
    pub async fn merge_step(
        &self,
        order_id: &OrderNumber,
        step: &str,
        payload: Value,
        expected_revision: Option<i64>,
    ) -> Result<FormProgressRecord, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Make sure a row exists so the lock below always has something to hold
        sqlx::query(
            "INSERT INTO mff.form_progress (order_id) VALUES ($1) ON CONFLICT (order_id) DO NOTHING",
        )
        .bind(order_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        let current = sqlx::query_as::<_, ProgressRow>(
            "SELECT data, revision, updated_at FROM mff.form_progress \
             WHERE order_id = $1 FOR UPDATE",
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(expected) = expected_revision
            && expected != current.revision
        {
            tx.rollback().await?;
            return Err(RepositoryError::Conflict(format!(
                "progress was modified concurrently (expected revision {expected}, found {})",
                current.revision
            )));
        }

        let mut data = current.data.0;
        let dropped = data.set_step(step, payload);
        if !dropped.is_empty() {
            tracing::debug!(order_id = %order_id, step, ?dropped, "Replaced preference steps");
        }

        let saved = sqlx::query_as::<_, ProgressRow>(
            "UPDATE mff.form_progress \
             SET data = $2, revision = revision + 1, updated_at = NOW() \
             WHERE order_id = $1 \
             RETURNING data, revision, updated_at",
        )
        .bind(order_id)
        .bind(Json(&data))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(saved.into())
    }
}
