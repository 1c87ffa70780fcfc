//! URL building and post-mutation redirect targets

use axum::response::Redirect;

use crate::models::{Comment, Post, User};

pub fn index_url() -> String {
    "/".to_string()
}

pub fn post_detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

/// Login page, optionally returning to `next` afterwards
pub fn login_url(next: Option<&str>) -> String {
    match next {
        Some(next) => format!("/auth/login/?next={}", urlencoding::encode(next)),
        None => "/auth/login/".to_string(),
    }
}

/// Public URL of a stored media file
pub fn media_url(relative: &str) -> String {
    format!("/media/{}", relative.trim_start_matches('/'))
}

/// Accept only same-site paths as a post-login destination
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.map(str::trim)
        .filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

/// Objects that live under a post
pub trait PostScoped {
    fn post_id(&self) -> i64;
}

impl PostScoped for Post {
    fn post_id(&self) -> i64 {
        self.id
    }
}

impl PostScoped for Comment {
    fn post_id(&self) -> i64 {
        self.post_id
    }
}

/// Where a successful create, edit or delete sends the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessTarget {
    /// Detail page of the post (a comment's own post)
    PostDetail,
    /// Profile of the requesting user
    Profile,
}

impl SuccessTarget {
    pub fn resolve<T: PostScoped + ?Sized>(self, object: &T, requester: &User) -> String {
        match self {
            SuccessTarget::PostDetail => post_detail_url(object.post_id()),
            SuccessTarget::Profile => profile_url(&requester.username),
        }
    }

    pub fn redirect<T: PostScoped + ?Sized>(self, object: &T, requester: &User) -> Redirect {
        Redirect::to(&self.resolve(object, requester))
    }
}
