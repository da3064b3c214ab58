//! Admin repository for database operations.

use sqlx::PgPool;

use mff_core::{AdminId, Email};

use super::RepositoryError;
use crate::models::Admin;

const ADMIN_COLUMNS: &str = "id, email, name, created_at";

/// Advisory lock key serialising the first-admin bootstrap.
const BOOTSTRAP_LOCK_KEY: i64 = 0x4d46_4641_444d; // "MFFADM"

/// Repository for admin account operations.
pub struct AdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminRepository<'a> {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an admin by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: AdminId) -> Result<Option<Admin>, RepositoryError> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM mff.admins WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(admin)
    }

    /// Get an admin together with their password hash, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(Admin, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminWithPassword>(&format!(
            "SELECT {ADMIN_COLUMNS}, password_hash FROM mff.admins WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (r.admin, r.password_hash)))
    }

    /// List all admins, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Admin>, RepositoryError> {
        let admins = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM mff.admins ORDER BY created_at, id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(admins)
    }

    /// Count admin accounts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM mff.admins")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Create an admin account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<Admin, RepositoryError> {
        sqlx::query_as::<_, Admin>(&format!(
            "INSERT INTO mff.admins (email, name, password_hash) VALUES ($1, $2, $3) \
             RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "admin email already exists"))
    }

    /// Create the very first admin.
    ///
    /// Returns `Ok(None)` if any admin already exists. The check and insert
    /// run under a transaction-scoped advisory lock, so two concurrent
    /// bootstrap requests cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn create_first(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<Option<Admin>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(BOOTSTRAP_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM mff.admins")
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let admin = sqlx::query_as::<_, Admin>(&format!(
            "INSERT INTO mff.admins (email, name, password_hash) VALUES ($1, $2, $3) \
             RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(admin))
    }
}

#[derive(sqlx::FromRow)]
struct AdminWithPassword {
    #[sqlx(flatten)]
    admin: Admin,
    password_hash: String,
}
