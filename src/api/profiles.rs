//! Profile pages
//!
//! - GET /profile/{username}/       - the user's posts visible to the requester
//! - GET|POST /profile/{username}/edit/ - only the user themself

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};

use crate::api::common::PageQuery;
use crate::api::guards::{ensure_author, Denial, Viewer};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{ProfileContext, ProfileFormContext};
use crate::api::urls::index_url;
use crate::models::UpdateProfileInput;

pub fn router() -> Router<AppState> {
    Router::new().route("/profile/{username}/", get(profile))
}

/// Mounted behind the login-required layer
pub fn protected_router() -> Router<AppState> {
    Router::new().route(
        "/profile/{username}/edit/",
        get(edit_form).post(edit_profile),
    )
}

/// GET /profile/{username}/ - The owner sees drafts and scheduled posts too
async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
    viewer: Viewer,
) -> Result<Json<ProfileContext>, ApiError> {
    let selector = query.selector()?;
    let profile = state.user_service.get_by_username(&username).await?;
    let page_obj = state
        .post_service
        .list_for_profile(profile.id, viewer.id(), selector)
        .await?;

    Ok(Json(ProfileContext { profile, page_obj }))
}

/// GET /profile/{username}/edit/
async fn edit_form(
    State(state): State<AppState>,
    Path(username): Path<String>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, ApiError> {
    let profile = state.user_service.get_by_username(&username).await?;
    if let Err(denial) = ensure_author(&profile, Some(&user), Denial::Forbidden) {
        return Ok(denial.into_response());
    }

    Ok(Json(ProfileFormContext { form: profile }).into_response())
}

/// POST /profile/{username}/edit/ - Back to the index when saved
async fn edit_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(input): Form<UpdateProfileInput>,
) -> Result<Response, ApiError> {
    let profile = state.user_service.get_by_username(&username).await?;
    if let Err(denial) = ensure_author(&profile, Some(&user), Denial::Forbidden) {
        return Ok(denial.into_response());
    }

    let updated = state.user_service.update_profile(profile.id, input).await?;
    tracing::info!(user_id = updated.id, username = %updated.username, "Profile updated");

    Ok(Redirect::to(&index_url()).into_response())
}
