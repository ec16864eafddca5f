use std::sync::Arc;

use crate::config::{Config, StorageBackend};
use crate::error::{AppError, Result};
use crate::repositories::{
    loan::{LoanStore, PgLoanStore},
    memory::{InMemoryLoanStore, InMemorySessionStore, InMemoryUserStore},
    session::{RedisSessionStore, SessionStore},
    user::{PgUserStore, UserStore},
};

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// Loan persistence.
    pub loans: Arc<dyn LoanStore>,
    /// Account persistence.
    pub users: Arc<dyn UserStore>,
    /// Session and CSRF token storage.
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    /// Creates a new `AppState`, connecting to the configured backends.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        match config.storage {
            StorageBackend::Memory => {
                tracing::warn!("⚠️  Using in-memory storage; data is lost on restart");
                Ok(Self::in_memory(config.clone()))
            }
            StorageBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| AppError::Internal("DATABASE_URL is not set".to_string()))?;

                let db = crate::db::create_pool(database_url)?;
                crate::db::run_migrations(&db).await?;
                tracing::info!("✅ PostgreSQL Pool initialized with deadpool-postgres");

                let sessions = RedisSessionStore::connect(&config.redis_url).await?;

                Ok(Self::from_parts(
                    config.clone(),
                    Arc::new(PgLoanStore::new(db.clone())),
                    Arc::new(PgUserStore::new(db)),
                    Arc::new(sessions),
                ))
            }
        }
    }

    /// State backed entirely by in-memory stores.
    pub fn in_memory(config: Config) -> Self {
        Self::from_parts(
            config,
            Arc::new(InMemoryLoanStore::new()),
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemorySessionStore::new()),
        )
    }

    pub fn from_parts(
        config: Config,
        loans: Arc<dyn LoanStore>,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            loans,
            users,
            sessions,
        }
    }
}
