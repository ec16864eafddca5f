use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::session::Session,
};

/// Session and CSRF token storage with expiry.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores a session under `token` for `ttl_secs`.
    async fn save(&self, token: Uuid, session: &Session, ttl_secs: u64) -> Result<()>;

    /// Loads a session. `None` when it never existed or has expired.
    async fn load(&self, token: Uuid) -> Result<Option<Session>>;

    /// Removes a session.
    async fn revoke(&self, token: Uuid) -> Result<()>;

    /// Registers a CSRF token for `ttl_secs`.
    async fn save_csrf(&self, token: &str, ttl_secs: u64) -> Result<()>;

    /// Whether a CSRF token is still live.
    async fn csrf_is_live(&self, token: &str) -> Result<bool>;

    /// Removes a CSRF token.
    async fn revoke_csrf(&self, token: &str) -> Result<()>;
}

fn session_key(token: Uuid) -> String {
    format!("session:{}", token)
}

fn csrf_key(token: &str) -> String {
    format!("csrf:{}", token)
}

/// Redis implementation of `SessionStore`. Expiry is delegated to key TTLs.
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    /// Opens a pooled connection manager to `redis_url`.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;
        tracing::info!("✅ Redis Connection Manager initialized (pooled)");
        Ok(Self::new(redis))
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn save(&self, token: Uuid, session: &Session, ttl_secs: u64) -> Result<()> {
        let session_json = sonic_rs::to_string(session)
            .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))?;

        let mut redis = self.redis.clone();
        let _: () = redis
            .set_ex(session_key(token), &session_json, ttl_secs)
            .await
            .map_err(|e| {
                tracing::error!("❌ Redis set_ex failed: {}", e);
                AppError::Redis(e)
            })?;
        Ok(())
    }

    async fn load(&self, token: Uuid) -> Result<Option<Session>> {
        let mut redis = self.redis.clone();
        let session_json: Option<String> = redis.get(session_key(token)).await?;

        match session_json {
            Some(json) => match sonic_rs::from_str::<Session>(&json) {
                Ok(session) => Ok(Some(session)),
                Err(e) => {
                    tracing::warn!("❌ Invalid session JSON: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn revoke(&self, token: Uuid) -> Result<()> {
        let mut redis = self.redis.clone();
        let _: usize = redis.del(session_key(token)).await?;
        Ok(())
    }

    async fn save_csrf(&self, token: &str, ttl_secs: u64) -> Result<()> {
        let mut redis = self.redis.clone();
        let _: () = redis
            .set_ex(csrf_key(token), "valid", ttl_secs)
            .await
            .map_err(|e| {
                tracing::error!("❌ Redis set_ex failed for CSRF: {}", e);
                AppError::Redis(e)
            })?;
        Ok(())
    }

    async fn csrf_is_live(&self, token: &str) -> Result<bool> {
        let mut redis = self.redis.clone();
        let live: bool = redis.exists(csrf_key(token)).await?;
        Ok(live)
    }

    async fn revoke_csrf(&self, token: &str) -> Result<()> {
        let mut redis = self.redis.clone();
        let _: usize = redis.del(csrf_key(token)).await?;
        Ok(())
    }
}
