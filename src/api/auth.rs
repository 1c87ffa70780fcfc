//! Authentication endpoints
//!
//! - GET|POST /auth/login/  - log in, then go to `next` or the profile
//! - POST /auth/signup/     - register and log in
//! - POST /auth/logout/     - end the session
//!
//! A successful login or sign-up sets the `session` cookie; the same token
//! is accepted as a Bearer token.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{extract_session_token, ApiError, AppState};
use crate::api::responses::LoginContext;
use crate::api::urls::{index_url, profile_url, safe_next};
use crate::services::user::{LoginInput, RegisterInput};

/// `?next=` on the login page
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Login form; `next` may also come from the query string
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Build the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login/", get(login_form).post(login))
        .route("/auth/signup/", post(signup))
        .route("/auth/logout/", post(logout))
}

/// GET /auth/login/
async fn login_form(Query(query): Query<NextQuery>) -> Json<LoginContext> {
    Json(LoginContext {
        next: safe_next(query.next.as_deref()).map(str::to_string),
    })
}

/// POST /auth/login/
async fn login(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let session = state
        .user_service
        .login(LoginInput::new(form.username.trim(), form.password))
        .await?;

    let target = match safe_next(form.next.as_deref().or(query.next.as_deref())) {
        Some(next) => next.to_string(),
        None => profile_url(form.username.trim()),
    };

    Ok(with_session_cookie(
        &session.id,
        state.user_service.session_expiration_days(),
        &target,
    ))
}

/// POST /auth/signup/
async fn signup(
    State(state): State<AppState>,
    Form(input): Form<RegisterInput>,
) -> Result<Response, ApiError> {
    let user = state.user_service.register(input).await?;
    let session = state.user_service.start_session(user.id).await?;

    Ok(with_session_cookie(
        &session.id,
        state.user_service.session_expiration_days(),
        &profile_url(&user.username),
    ))
}

/// POST /auth/logout/
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    if let Some(token) = extract_session_token(&headers) {
        state.user_service.logout(&token).await?;
    }

    let cookie = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0".to_string();
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(&index_url())).into_response())
}

fn with_session_cookie(token: &str, expiration_days: i64, target: &str) -> Response {
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token,
        expiration_days * 24 * 60 * 60
    );
    ([(header::SET_COOKIE, cookie)], Redirect::to(target)).into_response()
}
