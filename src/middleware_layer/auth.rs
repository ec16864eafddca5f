use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::session::Session,
    repositories::session::SessionStore,
    state::AppState,
};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_id";

/// Resolves who is making the current request.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// The current user's id, or `Unauthenticated`.
    async fn current_user(&self) -> Result<Uuid>;
}

/// Extracts the session token from the request cookies.
///
/// # Arguments
///
/// * `cookies` - The request cookies.
///
/// # Returns
///
/// An `Option` containing the session ID if found.
pub fn extract_session_token(cookies: &Cookies) -> Option<Uuid> {
    cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// Identity backed by the request's `session_id` cookie.
///
/// Extracting it never fails; a missing or stale session only surfaces when
/// `current_user` is called.
#[derive(Clone)]
pub struct SessionIdentity {
    sessions: Arc<dyn SessionStore>,
    token: Option<Uuid>,
}

impl SessionIdentity {
    pub fn new(sessions: Arc<dyn SessionStore>, token: Option<Uuid>) -> Self {
        Self { sessions, token }
    }

    /// The raw session token, if the request carried one.
    pub fn token(&self) -> Option<Uuid> {
        self.token
    }

    /// Loads the live session behind the token.
    pub async fn session(&self) -> Result<Session> {
        let token = self.token.ok_or_else(|| {
            tracing::warn!("❌ No session_id cookie found");
            AppError::Unauthenticated
        })?;

        let session = self.sessions.load(token).await?.ok_or_else(|| {
            tracing::warn!("❌ Session not found: {}", token);
            AppError::Unauthenticated
        })?;

        if session.is_expired() {
            tracing::warn!("❌ Session expired for user: {}", session.user_id);
            if let Err(e) = self.sessions.revoke(token).await {
                tracing::warn!("Failed to drop expired session {}: {}", token, e);
            }
            return Err(AppError::Unauthenticated);
        }

        Ok(session)
    }
}

#[async_trait]
impl IdentityResolver for SessionIdentity {
    async fn current_user(&self) -> Result<Uuid> {
        let session = self.session().await?;
        tracing::debug!("✅ User authenticated: {}", session.user_id);
        Ok(session.user_id)
    }
}

impl FromRequestParts<AppState> for SessionIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|(_, message)| AppError::Internal(message.to_string()))?;

        Ok(Self::new(state.sessions.clone(), extract_session_token(&cookies)))
    }
}

/// A fixed identity, for exercising services without a session store.
#[cfg(test)]
pub struct StaticIdentity(pub Option<Uuid>);

#[cfg(test)]
#[async_trait]
impl IdentityResolver for StaticIdentity {
    async fn current_user(&self) -> Result<Uuid> {
        self.0.ok_or(AppError::Unauthenticated)
    }
}
