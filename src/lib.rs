use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tower_cookies::CookieManagerLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub mod config;
pub mod db;
pub mod error;
pub mod state;

pub mod crypto {
    pub mod csrf;
    pub mod password;
}

pub mod models {
    pub mod loan;
    pub mod session;
    pub mod user;
}

pub mod validation {
    pub mod auth;
    pub mod loan;
}

pub mod serialization {
    pub mod loan;
}

pub mod repositories {
    pub mod loan;
    pub mod memory;
    pub mod session;
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod loans;
}

pub mod views {
    pub mod loan;
}

pub mod handlers {
    pub mod auth;
    pub mod extract;
    pub mod loans;
}

pub mod middleware_layer {
    pub mod auth;
    pub mod csrf;
}

use state::AppState;

/// Builds the application router.
///
/// Register and login are public. Everything else needs a session, and
/// state-changing requests also need a valid CSRF token.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/session", get(handlers::auth::session))
        .route(
            "/api/loans",
            get(handlers::loans::list_loans).post(handlers::loans::create_loan),
        )
        .route(
            "/api/loans/{id}",
            get(handlers::loans::get_loan)
                .put(handlers::loans::update_loan)
                .delete(handlers::loans::delete_loan),
        )
        .route("/api/loans/{id}/form", get(handlers::loans::edit_form))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::csrf::verify_csrf,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false))
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
}
