//! Common API utilities and shared types
//!
//! Query types used by several listings and the mapping from service
//! errors to [`ApiError`].

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::api::middleware::ApiError;
use crate::models::PageSelector;
use crate::services::{
    CategoryServiceError, CommentServiceError, FieldErrors, LocationServiceError,
    PostServiceError, UserServiceError,
};

// ============================================================================
// Pagination Query Types
// ============================================================================

/// `?page=N` or `?page=last`
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// Requested page; garbage is a 404 like an out-of-range number
    pub fn selector(&self) -> Result<PageSelector, ApiError> {
        PageSelector::parse(self.page.as_deref()).ok_or_else(|| ApiError::not_found("Invalid page"))
    }
}

// ============================================================================
// Path Parameters
// ============================================================================

/// Numeric URL segments. A segment that does not parse, or overflows,
/// names no resource and is a 404 rather than axum's plain-text 400.
#[derive(Debug)]
pub struct IdPath<T>(pub T);

impl<T, S> FromRequestParts<S> for IdPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(IdPath(value)),
            Err(rejection) => {
                tracing::debug!("Unresolvable path {}: {}", parts.uri.path(), rejection.body_text());
                Err(ApiError::not_found("Page not found"))
            }
        }
    }
}

// ============================================================================
// Service Error Mapping
// ============================================================================

impl From<PostServiceError> for ApiError {
    fn from(e: PostServiceError) -> Self {
        match e {
            PostServiceError::NotFound(id) => ApiError::not_found(format!("Post {} not found", id)),
            PostServiceError::PageNotFound => ApiError::not_found("Invalid page"),
            PostServiceError::ValidationError(errors) => ApiError::invalid_form(&errors),
            PostServiceError::InternalError(err) => ApiError::internal(err),
        }
    }
}

impl From<CommentServiceError> for ApiError {
    fn from(e: CommentServiceError) -> Self {
        match e {
            CommentServiceError::NotFound(id) => {
                ApiError::not_found(format!("Comment {} not found", id))
            }
            CommentServiceError::ValidationError(errors) => ApiError::invalid_form(&errors),
            CommentServiceError::InternalError(err) => ApiError::internal(err),
        }
    }
}

impl From<CategoryServiceError> for ApiError {
    fn from(e: CategoryServiceError) -> Self {
        match e {
            CategoryServiceError::NotFound(key) => {
                ApiError::not_found(format!("Category {} not found", key))
            }
            CategoryServiceError::DuplicateSlug(slug) => ApiError::invalid_form(
                &FieldErrors::single("slug", format!("Category with slug '{}' already exists.", slug)),
            ),
            CategoryServiceError::ValidationError(errors) => ApiError::invalid_form(&errors),
            CategoryServiceError::InternalError(err) => ApiError::internal(err),
        }
    }
}

impl From<LocationServiceError> for ApiError {
    fn from(e: LocationServiceError) -> Self {
        match e {
            LocationServiceError::NotFound(id) => {
                ApiError::not_found(format!("Location {} not found", id))
            }
            LocationServiceError::ValidationError(errors) => ApiError::invalid_form(&errors),
            LocationServiceError::InternalError(err) => ApiError::internal(err),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::AuthenticationError(_) => ApiError::invalid_form(&FieldErrors::single(
                "__all__",
                "Please enter a correct username and password.",
            )),
            UserServiceError::ValidationError(errors) => ApiError::invalid_form(&errors),
            UserServiceError::NotFound(name) => {
                ApiError::not_found(format!("User {} not found", name))
            }
            UserServiceError::InternalError(err) => ApiError::internal(err),
        }
    }
}
