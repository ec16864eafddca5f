use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::user::User,
};

/// Account persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates a user. Fails with `Conflict` when the email is taken.
    async fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User>;

    /// Finds a user by their (lowercased) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Finds a user by their ID.
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>>;
}

/// PostgreSQL implementation of `UserStore`.
#[derive(Clone)]
pub struct PgUserStore {
    pool: Pool,
}

impl PgUserStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO users (id, name, email, password)
                VALUES ($1, $2, $3, $4)
                RETURNING id, name, email, password, created_at, updated_at
                "#,
                &[&Uuid::new_v4(), &name, &email, &password_hash],
            )
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    AppError::Conflict("Email already in use".to_string())
                } else {
                    AppError::Database(e)
                }
            })?;
        User::try_from(&row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, name, email, password, created_at, updated_at
                FROM users
                WHERE email = $1
                "#,
                &[&email],
            )
            .await?;
        row.map(|r| User::try_from(&r)).transpose()
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, name, email, password, created_at, updated_at
                FROM users
                WHERE id = $1
                "#,
                &[&user_id],
            )
            .await?;
        row.map(|r| User::try_from(&r)).transpose()
    }
}
