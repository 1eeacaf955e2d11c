//! User repository for database operations

use anyhow::Result;
use async_trait::async_trait;
use common::error::DatabaseError;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::{NewUser, ProfileChanges, User};
use crate::password::PasswordService;

const USER_COLUMNS: &str =
    "id, name, email, password, email_verified_at, remember_token, created_at, updated_at";

/// Persistence boundary for user records
///
/// Every write path passes password values through
/// [`PasswordService::ensure_hashed`], so plaintext never reaches storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Whether another user already owns `email`, ignoring case
    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool>;

    /// Create a new user
    async fn create(&self, new_user: &NewUser) -> Result<User>;

    /// Apply a validated profile update atomically
    ///
    /// Returns `None` when no user has the given ID.
    async fn update_profile(&self, id: Uuid, changes: &ProfileChanges) -> Result<Option<User>>;
}

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
    passwords: PasswordService,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool, passwords: PasswordService) -> Self {
        Self { pool, passwords }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        info!("Finding user by ID: {}", id);

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(user)
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE lower(email) = lower($1) AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(taken)
    }

    async fn create(&self, new_user: &NewUser) -> Result<User> {
        info!("Creating new user: {}", new_user.email);

        let password = self.passwords.ensure_hashed(&new_user.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&password)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, changes: &ProfileChanges) -> Result<Option<User>> {
        info!("Updating profile for user: {}", id);

        let password = changes
            .password
            .as_deref()
            .map(|p| self.passwords.ensure_hashed(p))
            .transpose()?;

        let mut tx = self.pool.begin().await.map_err(DatabaseError::Connection)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = $2,
                email = $3,
                password = COALESCE($4, password),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(password)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DatabaseError::Query)?;

        tx.commit().await.map_err(DatabaseError::Query)?;

        Ok(user)
    }
}
