use axum::{
    body::Body,
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_cookies::Cookies;

use crate::{crypto::csrf::tokens_match, error::AppError, state::AppState};

/// Name of the cookie carrying the CSRF token.
pub const CSRF_COOKIE: &str = "csrf_token";
/// Header that must echo the CSRF cookie on state-changing requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// A middleware that verifies the CSRF token.
///
/// Safe methods pass through. Anything else must send the `csrf_token` cookie
/// and an identical `x-csrf-token` header, and the token must still be live.
pub async fn verify_csrf(
    State(state): State<AppState>,
    cookies: Cookies,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() == Method::GET
        || req.method() == Method::HEAD
        || req.method() == Method::OPTIONS
    {
        tracing::debug!("✅ CSRF exemption: {} request", req.method());
        return next.run(req).await;
    }

    let csrf_token_cookie = match cookies.get(CSRF_COOKIE) {
        Some(c) => c.value().to_string(),
        None => {
            return AppError::Forbidden("Missing CSRF token cookie".to_string()).into_response();
        }
    };

    let csrf_token_header = match req.headers().get(CSRF_HEADER) {
        Some(token) => match token.to_str() {
            Ok(t) => t.to_string(),
            Err(_) => {
                return AppError::Forbidden("Invalid CSRF token format".to_string())
                    .into_response();
            }
        },
        None => {
            return AppError::Forbidden("Missing CSRF token header".to_string()).into_response();
        }
    };

    if !tokens_match(&csrf_token_cookie, &csrf_token_header) {
        return AppError::Forbidden("CSRF token mismatch".to_string()).into_response();
    }

    match state.sessions.csrf_is_live(&csrf_token_cookie).await {
        Ok(true) => {
            tracing::debug!("✅ CSRF token valid");
            next.run(req).await
        }
        Ok(false) => {
            AppError::Forbidden("CSRF token expired or invalid".to_string()).into_response()
        }
        Err(e) => {
            tracing::error!("❌ CSRF: session store error: {}", e);
            e.into_response()
        }
    }
}
