//! Comment endpoints
//!
//! All of them require login. A comment is addressed through its post;
//! a comment id under the wrong post is a 404.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};

use crate::api::common::IdPath;
use crate::api::guards::{ensure_author, Denial};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::CommentContext;
use crate::api::urls::SuccessTarget;
use crate::models::{Comment, CommentForm};

/// Build the comment router. Mounted behind the login-required layer.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/{post_id}/comment/", post(add_comment))
        .route(
            "/posts/{post_id}/edit_comment/{comment_id}/",
            get(edit_form).post(edit_comment),
        )
        .route(
            "/posts/{post_id}/delete_comment/{comment_id}/",
            get(delete_form).post(delete_comment),
        )
}

/// POST /posts/{post_id}/comment/ - Only posts the requester can see
/// accept comments
async fn add_comment(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<i64>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(form): Form<CommentForm>,
) -> Result<Response, ApiError> {
    let post = state.post_service.get_visible(post_id, Some(user.id)).await?;
    let comment = state
        .comment_service
        .create(post.id, user.id, &form.text)
        .await?;

    Ok(SuccessTarget::PostDetail.redirect(&comment, &user).into_response())
}

/// GET /posts/{post_id}/edit_comment/{comment_id}/
async fn edit_form(
    State(state): State<AppState>,
    IdPath((post_id, comment_id)): IdPath<(i64, i64)>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, ApiError> {
    let comment = state.comment_service.get(post_id, comment_id).await?;
    if let Err(denial) = ensure_author(&comment, Some(&user), Denial::Forbidden) {
        return Ok(denial.into_response());
    }

    Ok(Json(context(comment)).into_response())
}

/// POST /posts/{post_id}/edit_comment/{comment_id}/
async fn edit_comment(
    State(state): State<AppState>,
    IdPath((post_id, comment_id)): IdPath<(i64, i64)>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(form): Form<CommentForm>,
) -> Result<Response, ApiError> {
    let comment = state.comment_service.get(post_id, comment_id).await?;
    if let Err(denial) = ensure_author(&comment, Some(&user), Denial::Forbidden) {
        return Ok(denial.into_response());
    }

    let updated = state
        .comment_service
        .update(post_id, comment.id, &form.text)
        .await?;

    Ok(SuccessTarget::PostDetail.redirect(&updated, &user).into_response())
}

/// GET /posts/{post_id}/delete_comment/{comment_id}/ - Confirmation
async fn delete_form(
    State(state): State<AppState>,
    IdPath((post_id, comment_id)): IdPath<(i64, i64)>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, ApiError> {
    let comment = state.comment_service.get(post_id, comment_id).await?;
    if let Err(denial) = ensure_author(&comment, Some(&user), Denial::Forbidden) {
        return Ok(denial.into_response());
    }

    Ok(Json(context(comment)).into_response())
}

/// POST /posts/{post_id}/delete_comment/{comment_id}/
async fn delete_comment(
    State(state): State<AppState>,
    IdPath((post_id, comment_id)): IdPath<(i64, i64)>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, ApiError> {
    let comment = state.comment_service.get(post_id, comment_id).await?;
    if let Err(denial) = ensure_author(&comment, Some(&user), Denial::Forbidden) {
        return Ok(denial.into_response());
    }

    state.comment_service.delete(post_id, comment.id).await?;
    tracing::debug!(comment_id, post_id, "Comment deleted");

    Ok(SuccessTarget::PostDetail.redirect(&comment, &user).into_response())
}

fn context(comment: Comment) -> CommentContext {
    let form = CommentForm {
        text: comment.text.clone(),
    };
    CommentContext { comment, form }
}
