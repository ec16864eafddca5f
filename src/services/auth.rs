use uuid::Uuid;

use crate::config::Config;
use crate::crypto::{
    csrf::generate_csrf_token,
    password::{hash_password, verify_password},
};
use crate::error::{AppError, Result};
use crate::models::{session::Session, user::User};
use crate::repositories::{session::SessionStore, user::UserStore};
use crate::validation::auth::{
    LoginRequest, RegisterRequest, normalize_email, validate_login, validate_register,
};

/// Lifetime of a CSRF token in seconds.
pub const CSRF_TTL_SECS: u64 = 3600;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Tokens handed to the client after a successful login.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session_id: Uuid,
    pub csrf_token: String,
}

/// Creates a new account.
///
/// # Arguments
///
/// * `users` - The account store.
/// * `request` - The registration payload.
///
/// # Returns
///
/// A `Result` containing the created `User`.
pub async fn register_user(users: &dyn UserStore, request: &RegisterRequest) -> Result<User> {
    validate_register(request)?;

    let email = normalize_email(&request.email);
    tracing::debug!("🔐 Creating user: {}", email);

    if users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already in use".to_string()));
    }

    let hashed_password = hash_password(&request.password)?;
    let user = users
        .create(&request.full_name(), &email, &hashed_password)
        .await?;

    tracing::info!("✅ User created with ID: {}", user.id);
    Ok(user)
}

/// Authenticates a user by email and password.
///
/// Unknown emails and wrong passwords fail with the same message.
pub async fn authenticate_user(users: &dyn UserStore, request: &LoginRequest) -> Result<User> {
    validate_login(request)?;

    let email = normalize_email(&request.email);
    tracing::debug!("🔐 Authenticating user: {}", email);

    let user = users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(&request.password, &user.password)? {
        return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
    }

    tracing::info!("✅ User authenticated: {}", user.id);
    Ok(user)
}

/// Stores a fresh session and CSRF token for `user_id`.
pub async fn start_session(
    sessions: &dyn SessionStore,
    config: &Config,
    user_id: Uuid,
) -> Result<IssuedSession> {
    let session_id = Uuid::new_v4();
    let session = Session::start(user_id, config.session_duration_days);
    sessions
        .save(session_id, &session, config.session_ttl_secs())
        .await?;
    tracing::info!("✅ Session saved: session:{}", session_id);

    let csrf_token = issue_csrf_token(sessions).await?;

    Ok(IssuedSession {
        session_id,
        csrf_token,
    })
}

/// Stores a new CSRF token for [`CSRF_TTL_SECS`].
pub async fn issue_csrf_token(sessions: &dyn SessionStore) -> Result<String> {
    let csrf_token = generate_csrf_token();
    sessions.save_csrf(&csrf_token, CSRF_TTL_SECS).await?;
    tracing::debug!("🔐 CSRF token stored");
    Ok(csrf_token)
}

/// Revokes a session and, when given, its CSRF token.
pub async fn end_session(
    sessions: &dyn SessionStore,
    session_id: Uuid,
    csrf_token: Option<&str>,
) -> Result<()> {
    sessions.revoke(session_id).await?;
    tracing::info!("✅ Session deleted: session:{}", session_id);

    if let Some(token) = csrf_token {
        if let Err(e) = sessions.revoke_csrf(token).await {
            tracing::warn!("Failed to revoke CSRF token: {}", e);
        }
    }
    Ok(())
}

/// Looks up the account behind a live session.
pub async fn current_user(users: &dyn UserStore, user_id: Uuid) -> Result<User> {
    users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::{InMemorySessionStore, InMemoryUserStore};

    fn registration(email: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            password: "Sup3rSecret".to_string(),
            confirm_password: "Sup3rSecret".to_string(),
        }
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn registered_users_can_log_in() {
        let users = InMemoryUserStore::new();
        let user = register_user(&users, &registration("Ada@Example.com"))
            .await
            .unwrap();
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.email, "ada@example.com");
        assert_ne!(user.password, "Sup3rSecret");

        let logged_in = authenticate_user(&users, &login("ada@example.com", "Sup3rSecret"))
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let users = InMemoryUserStore::new();
        register_user(&users, &registration("ada@example.com"))
            .await
            .unwrap();
        let err = register_user(&users, &registration("ADA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn bad_credentials_share_one_message() {
        let users = InMemoryUserStore::new();
        register_user(&users, &registration("ada@example.com"))
            .await
            .unwrap();

        let wrong_password = authenticate_user(&users, &login("ada@example.com", "Wr0ngPass"))
            .await
            .unwrap_err();
        let unknown_email = authenticate_user(&users, &login("bob@example.com", "Sup3rSecret"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn sessions_start_and_end() {
        let sessions = InMemorySessionStore::new();
        let config = Config::in_memory();
        let user_id = Uuid::new_v4();

        let issued = start_session(&sessions, &config, user_id).await.unwrap();
        let session = sessions.load(issued.session_id).await.unwrap().unwrap();
        assert_eq!(session.user_id, user_id);
        assert!(sessions.csrf_is_live(&issued.csrf_token).await.unwrap());

        end_session(&sessions, issued.session_id, Some(&issued.csrf_token))
            .await
            .unwrap();
        assert!(sessions.load(issued.session_id).await.unwrap().is_none());
        assert!(!sessions.csrf_is_live(&issued.csrf_token).await.unwrap());
    }

    #[tokio::test]
    async fn expired_csrf_token_can_be_reissued_for_a_live_session() {
        let sessions = InMemorySessionStore::new();
        let config = Config::in_memory();
        let issued = start_session(&sessions, &config, Uuid::new_v4()).await.unwrap();

        // Re-register the token with no lifetime left.
        sessions.save_csrf(&issued.csrf_token, 0).await.unwrap();
        assert!(!sessions.csrf_is_live(&issued.csrf_token).await.unwrap());
        assert!(sessions.load(issued.session_id).await.unwrap().is_some());

        let fresh = issue_csrf_token(&sessions).await.unwrap();
        assert_ne!(fresh, issued.csrf_token);
        assert!(sessions.csrf_is_live(&fresh).await.unwrap());
    }

    #[tokio::test]
    async fn current_user_requires_an_existing_account() {
        let users = InMemoryUserStore::new();
        let err = current_user(&users, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }
}
