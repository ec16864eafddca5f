use axum::{
    Json,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tower_cookies::cookie::{SameSite, time::Duration};
use tower_cookies::{Cookie, Cookies};

use crate::{
    error::{AppError, Result},
    handlers::extract::AppJson,
    middleware_layer::{
        auth::{IdentityResolver, SESSION_COOKIE, SessionIdentity},
        csrf::{CSRF_COOKIE, CSRF_HEADER},
    },
    models::user::UserProfile,
    services::auth::{self as auth_service, CSRF_TTL_SECS, IssuedSession},
    state::AppState,
    validation::auth::{LoginRequest, RegisterRequest},
};

/// The response payload for authentication-related requests.
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

/// Creates a cookie with the given name, value, and max age.
///
/// Everything except the CSRF token is HttpOnly, since the client has to read
/// that one back into the `x-csrf-token` header.
fn create_secure_cookie(
    name: &'static str,
    value: String,
    max_age_secs: u64,
    secure: bool,
) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);

    if name != CSRF_COOKIE {
        cookie.set_http_only(true);
    }

    if secure {
        cookie.set_secure(true);
    }

    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(Duration::seconds(max_age_secs as i64));
    cookie.set_path("/");

    cookie
}

fn expired_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, "");
    cookie.set_max_age(Duration::seconds(0));
    cookie.set_path("/");
    cookie
}

fn set_csrf_cookie(state: &AppState, cookies: &Cookies, csrf_token: String) {
    cookies.add(create_secure_cookie(
        CSRF_COOKIE,
        csrf_token,
        CSRF_TTL_SECS,
        state.config.secure_cookies,
    ));
}

fn set_session_cookies(state: &AppState, cookies: &Cookies, issued: IssuedSession) {
    cookies.add(create_secure_cookie(
        SESSION_COOKIE,
        issued.session_id.to_string(),
        state.config.session_ttl_secs(),
        state.config.secure_cookies,
    ));
    set_csrf_cookie(state, cookies, issued.csrf_token);
    tracing::debug!("✅ Session and CSRF cookies added");
}

/// Handles user registration. The new user is logged in straight away.
pub async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Response> {
    tracing::info!("📝 Register attempt");

    let user = auth_service::register_user(state.users.as_ref(), &payload).await?;
    let issued = auth_service::start_session(state.sessions.as_ref(), &state.config, user.id).await?;
    set_session_cookies(&state, &cookies, issued);

    tracing::info!("✅ User registered: {}", user.id);

    let response = AuthResponse {
        success: true,
        message: "Registration successful. Welcome!".to_string(),
        user: Some(UserProfile::from(&user)),
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Handles user login.
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Login attempt");

    let user = auth_service::authenticate_user(state.users.as_ref(), &payload).await?;
    let issued = auth_service::start_session(state.sessions.as_ref(), &state.config, user.id).await?;
    set_session_cookies(&state, &cookies, issued);

    tracing::info!("✅ User logged in: {}", user.id);

    let response = AuthResponse {
        success: true,
        message: "Login successful".to_string(),
        user: Some(UserProfile::from(&user)),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles user logout.
pub async fn logout(
    State(state): State<AppState>,
    identity: SessionIdentity,
    cookies: Cookies,
) -> Result<Response> {
    let session = identity.session().await?;
    let session_id = identity.token().ok_or(AppError::Unauthenticated)?;
    tracing::info!("👋 Logout for user: {}", session.user_id);

    let csrf_token = cookies.get(CSRF_COOKIE).map(|c| c.value().to_string());
    auth_service::end_session(state.sessions.as_ref(), session_id, csrf_token.as_deref()).await?;

    cookies.remove(expired_cookie(SESSION_COOKIE));
    cookies.remove(expired_cookie(CSRF_COOKIE));

    tracing::info!("✅ User logged out: {}", session.user_id);

    let response = AuthResponse {
        success: true,
        message: "Logout successful".to_string(),
        user: None,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Returns the signed-in user and hands out a fresh CSRF token, both as the
/// `csrf_token` cookie and the `x-csrf-token` response header.
pub async fn session(
    State(state): State<AppState>,
    identity: SessionIdentity,
    cookies: Cookies,
) -> Result<Response> {
    let user_id = identity.current_user().await?;
    let user = auth_service::current_user(state.users.as_ref(), user_id).await?;

    let csrf_token = auth_service::issue_csrf_token(state.sessions.as_ref()).await?;
    let header_value = HeaderValue::from_str(&csrf_token)
        .map_err(|e| AppError::Internal(format!("CSRF token is not a header value: {}", e)))?;
    set_csrf_cookie(&state, &cookies, csrf_token);

    Ok((
        [(CSRF_HEADER, header_value)],
        Json(UserProfile::from(&user)),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = create_secure_cookie(SESSION_COOKIE, "abc".to_string(), 60, true);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(60)));
    }

    #[test]
    fn csrf_cookie_is_readable_by_scripts() {
        let cookie = create_secure_cookie(CSRF_COOKIE, "abc".to_string(), 60, false);
        assert_ne!(cookie.http_only(), Some(true));
        assert_ne!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }
}
