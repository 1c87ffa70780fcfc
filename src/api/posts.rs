//! Post pages
//!
//! - GET /                          - published posts, paginated
//! - GET /posts/{post_id}/          - one post with its comments
//! - GET|POST /posts/create/        - new post (login required)
//! - GET|POST /posts/{post_id}/edit/    - edit (author only)
//! - GET|POST /posts/{post_id}/delete/  - delete (author only)
//!
//! Non-authors who reach the edit or delete page are sent back to the post.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::api::common::{IdPath, PageQuery};
use crate::api::guards::{ensure_author, Denial, Viewer};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{IndexContext, PostContext, PostDetailContext, PostFormContext};
use crate::api::upload::{remove_media, save_post_image, ImageUpload};
use crate::api::urls::{index_url, post_detail_url, SuccessTarget};
use crate::config::UploadConfig;
use crate::models::{CommentForm, CreatePostInput, Post, UpdatePostInput, User};
use crate::services::FieldErrors;

/// Routes open to everyone. Edit and delete do their own author check.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/posts/{post_id}/", get(post_detail))
        .route("/posts/{post_id}/edit/", get(edit_form).post(edit_post))
        .route("/posts/{post_id}/delete/", get(delete_form).post(delete_post))
}

/// Routes behind the login-required layer
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/posts/create/", get(create_form).post(create_post))
}

// ============================================================================
// Read
// ============================================================================

/// GET / - Published posts, newest first
async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<IndexContext>, ApiError> {
    let page_obj = state.post_service.list_published(query.selector()?).await?;
    Ok(Json(IndexContext { page_obj }))
}

/// GET /posts/{post_id}/ - A post visible to the requester
async fn post_detail(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<i64>,
    viewer: Viewer,
) -> Result<Json<PostDetailContext>, ApiError> {
    let post = state.post_service.get_visible(post_id, viewer.id()).await?;
    let comments = state.comment_service.list_for_post(post.id).await?;

    Ok(Json(PostDetailContext {
        post,
        form: CommentForm::default(),
        comments,
    }))
}

// ============================================================================
// Create
// ============================================================================

/// GET /posts/create/
async fn create_form(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<PostFormContext>, ApiError> {
    Ok(Json(form_context(&state, None).await?))
}

/// POST /posts/create/ - The requester becomes the author. A form without
/// `is_published` publishes the post.
async fn create_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let form = PostForm::read(multipart, &state.upload_config).await?;
    let image = store_image(&state, form.image.as_ref()).await?;

    let input = CreatePostInput {
        title: form.title,
        text: form.text,
        pub_date: form.pub_date,
        image: image.clone(),
        is_published: form.is_published.unwrap_or(true),
        location_id: form.location_id,
        category_id: form.category_id,
    };

    match state.post_service.create(user.id, input).await {
        Ok(post) => Ok(SuccessTarget::Profile.redirect(&post, &user).into_response()),
        Err(e) => {
            if let Some(path) = image {
                remove_media(&state.upload_config, &path).await;
            }
            Err(e.into())
        }
    }
}

// ============================================================================
// Edit
// ============================================================================

/// GET /posts/{post_id}/edit/
async fn edit_form(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<i64>,
    viewer: Viewer,
) -> Result<Response, ApiError> {
    let post = state.post_service.get(post_id).await?;
    if let Err(denial) = post_author(&post, &viewer) {
        return Ok(denial.into_response());
    }

    Ok(Json(form_context(&state, Some(post)).await?).into_response())
}

/// POST /posts/{post_id}/edit/ - Blank `pub_date`, no image or no
/// `is_published` keeps the stored value
async fn edit_post(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<i64>,
    viewer: Viewer,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let post = state.post_service.get(post_id).await?;
    let user = match post_author(&post, &viewer) {
        Ok(user) => user,
        Err(denial) => return Ok(denial.into_response()),
    };

    let form = PostForm::read(multipart, &state.upload_config).await?;
    let image = store_image(&state, form.image.as_ref()).await?;

    let input = UpdatePostInput {
        title: form.title,
        text: form.text,
        pub_date: form.pub_date,
        image: image.clone(),
        is_published: form.is_published,
        location_id: form.location_id,
        category_id: form.category_id,
    };

    match state.post_service.update(post.id, input).await {
        Ok(updated) => {
            if let (Some(_), Some(old)) = (&image, &post.image) {
                remove_media(&state.upload_config, old).await;
            }
            Ok(SuccessTarget::PostDetail.redirect(&updated, user).into_response())
        }
        Err(e) => {
            if let Some(path) = image {
                remove_media(&state.upload_config, &path).await;
            }
            Err(e.into())
        }
    }
}

// ============================================================================
// Delete
// ============================================================================

/// GET /posts/{post_id}/delete/ - Confirmation
async fn delete_form(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<i64>,
    viewer: Viewer,
) -> Result<Response, ApiError> {
    let post = state.post_service.get(post_id).await?;
    if let Err(denial) = post_author(&post, &viewer) {
        return Ok(denial.into_response());
    }

    Ok(Json(PostContext { post }).into_response())
}

/// POST /posts/{post_id}/delete/ - Deletes the post, its comments and its
/// image, then returns to the index
async fn delete_post(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<i64>,
    viewer: Viewer,
) -> Result<Response, ApiError> {
    let post = state.post_service.get(post_id).await?;
    if let Err(denial) = post_author(&post, &viewer) {
        return Ok(denial.into_response());
    }

    let deleted = state.post_service.delete(post.id).await?;
    if let Some(image) = &deleted.image {
        remove_media(&state.upload_config, image).await;
    }

    Ok(Redirect::to(&index_url()).into_response())
}

// ============================================================================
// Helpers
// ============================================================================

/// The requester, if they wrote `post`; everyone else goes back to the post
fn post_author<'a>(post: &Post, viewer: &'a Viewer) -> Result<&'a User, Denial> {
    let denial = Denial::RedirectTo(post_detail_url(post.id));
    ensure_author(post, viewer.user(), denial.clone())?;
    viewer.user().ok_or(denial)
}

async fn form_context(state: &AppState, post: Option<Post>) -> Result<PostFormContext, ApiError> {
    Ok(PostFormContext {
        post,
        categories: state.category_service.list().await?,
        locations: state.location_service.list().await?,
    })
}

async fn store_image(
    state: &AppState,
    image: Option<&ImageUpload>,
) -> Result<Option<String>, ApiError> {
    match image {
        Some(image) => save_post_image(&state.upload_config, image)
            .await
            .map(Some)
            .map_err(ApiError::internal),
        None => Ok(None),
    }
}

/// Submitted post form, after field-level parsing
#[derive(Debug, Default)]
struct PostForm {
    title: String,
    text: String,
    pub_date: Option<DateTime<Utc>>,
    location_id: Option<i64>,
    category_id: Option<i64>,
    /// `None` when the form left the field out
    is_published: Option<bool>,
    image: Option<ImageUpload>,
}

impl PostForm {
    /// Read a `multipart/form-data` post form. Unparseable values are
    /// collected as field errors.
    async fn read(
        multipart: Result<Multipart, MultipartRejection>,
        config: &UploadConfig,
    ) -> Result<Self, ApiError> {
        let mut multipart = multipart.map_err(|e| ApiError::validation_error(e.body_text()))?;
        let mut form = PostForm::default();
        let mut errors = FieldErrors::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read form: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();

            if name == "image" {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let has_file_name = field.file_name().is_some_and(|n| !n.is_empty());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation_error(format!("Failed to read image: {}", e)))?;

                // Browsers send an empty part when no file was chosen
                if !has_file_name && data.is_empty() {
                    continue;
                }
                let image = ImageUpload { content_type, data };
                match image.check(config) {
                    Ok(()) => form.image = Some(image),
                    Err(message) => errors.add("image", message),
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| ApiError::validation_error(format!("Failed to read form: {}", e)))?;

            match name.as_str() {
                "title" => form.title = value,
                "text" => form.text = value,
                "pub_date" => match parse_datetime_local(&value) {
                    Some(pub_date) => form.pub_date = pub_date,
                    None => errors.add("pub_date", "Enter a valid date/time."),
                },
                "location" => match parse_choice(&value) {
                    Some(id) => form.location_id = id,
                    None => errors.add("location", "Select a valid choice."),
                },
                "category" => match parse_choice(&value) {
                    Some(id) => form.category_id = id,
                    None => errors.add("category", "Select a valid choice."),
                },
                "is_published" => form.is_published = Some(is_checked(&value)),
                _ => {}
            }
        }

        errors.into_result().map_err(|e| ApiError::invalid_form(&e))?;
        Ok(form)
    }
}

/// Parse a `datetime-local` value as UTC. `Some(None)` for a blank value,
/// `None` when unparseable.
fn parse_datetime_local(value: &str) -> Option<Option<DateTime<Utc>>> {
    let value = value.trim();
    if value.is_empty() {
        return Some(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(Some(dt.with_timezone(&Utc)));
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Some(Utc.from_utc_datetime(&naive)))
}

/// Parse a select value: blank is no choice, otherwise an id
fn parse_choice(value: &str) -> Option<Option<i64>> {
    let value = value.trim();
    if value.is_empty() {
        return Some(None);
    }
    value.parse().ok().map(Some)
}

/// A submitted checkbox is on unless its value reads as false
fn is_checked(value: &str) -> bool {
    !matches!(value.trim(), "" | "0" | "false" | "False" | "off")
}
