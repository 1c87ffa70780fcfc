//! Request guards
//!
//! Who is asking ([`Viewer`], [`AuthenticatedUser`]) and whether they may
//! change a resource ([`ensure_author`]).

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Uri},
    response::{IntoResponse, Redirect, Response},
};
use std::convert::Infallible;

use crate::api::middleware::{ApiError, AuthenticatedUser};
use crate::api::urls::login_url;
use crate::models::{Comment, Post, User};

/// Resources owned by a single user
pub trait Authored {
    fn author_id(&self) -> i64;
}

impl Authored for Post {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}

/// A user's profile belongs to the user
impl Authored for User {
    fn author_id(&self) -> i64 {
        self.id
    }
}

/// Response given to a requester who is not the author
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Denial {
    /// 403
    #[default]
    Forbidden,
    /// 303 to the given URL
    RedirectTo(String),
}

impl IntoResponse for Denial {
    fn into_response(self) -> Response {
        match self {
            Denial::Forbidden => {
                ApiError::forbidden("Only the author may do this").into_response()
            }
            Denial::RedirectTo(url) => Redirect::to(&url).into_response(),
        }
    }
}

/// Permit the request only when `requester` wrote `resource`.
/// Anonymous requesters are denied the same way.
pub fn ensure_author<R: Authored + ?Sized>(
    resource: &R,
    requester: Option<&User>,
    denial: Denial,
) -> Result<(), Denial> {
    match requester {
        Some(user) if user.id == resource.author_id() => Ok(()),
        _ => Err(denial),
    }
}

/// Redirect to the login page, coming back to `uri` afterwards
pub fn login_redirect(uri: &Uri) -> Redirect {
    let next = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    Redirect::to(&login_url(Some(next)))
}

/// The requester, logged in or not
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<User>);

impl Viewer {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }

    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Viewer(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|u| u.0.clone()),
        ))
    }
}

/// Logged-in requester; anonymous requests are redirected to login
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| login_redirect(&parts.uri))
    }
}
