//! API layer - HTTP handlers and routing
//!
//! This module contains the site's HTTP endpoints:
//! - Post pages (index, detail, create, edit, delete)
//! - Comment endpoints
//! - Profile pages
//! - Category pages
//! - Login, sign-up and logout
//! - Uploaded media under `/media/`

pub mod auth;
pub mod categories;
pub mod comments;
pub mod common;
pub mod guards;
pub mod middleware;
pub mod posts;
pub mod profiles;
pub mod responses;
pub mod upload;
pub mod urls;

#[cfg(test)]
mod tests;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use guards::{ensure_author, Authored, Denial, Viewer};
pub use middleware::{ApiError, AppState, AuthenticatedUser};
pub use urls::SuccessTarget;

/// Room left in the body limit for the text fields of a post form
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the page routes
pub fn build_page_router(state: AppState) -> Router<AppState> {
    // Login required: anonymous requests go to the login page
    let protected_routes = Router::new()
        .merge(posts::protected_router())
        .merge(comments::router())
        .merge(profiles::protected_router())
        .route_layer(axum_middleware::from_fn(middleware::require_login));

    // Public routes
    Router::new()
        .merge(posts::router())
        .merge(profiles::router())
        .merge(categories::router())
        .merge(auth::router())
        .merge(protected_routes)
        .layer(axum_middleware::from_fn_with_state(
            state,
            middleware::optional_auth,
        ))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let body_limit = usize::try_from(state.upload_config.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD_BYTES);

    let mut router = Router::new()
        .merge(build_page_router(state.clone()))
        .nest_service("/media", ServeDir::new(&state.upload_config.path))
        .layer(DefaultBodyLimit::max(body_limit));

    // CORS configuration - cookie authentication needs an explicit origin
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(origin)
                    .allow_methods([Method::GET, Method::POST])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
                    .allow_credentials(true),
            );
        }
        Err(_) => tracing::warn!("Invalid CORS origin '{}', CORS disabled", cors_origin),
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
