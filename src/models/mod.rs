//! Data models
//!
//! Database entities (User, Session, Category, Location, Post, Comment),
//! their create/update inputs, and the pagination types shared by every
//! listing.

mod category;
mod comment;
mod location;
mod pagination;
mod post;
mod session;
mod user;

pub use category::{Category, CreateCategoryInput, UpdateCategoryInput};
pub use comment::{Comment, CommentForm};
pub use location::{CreateLocationInput, Location, UpdateLocationInput};
pub use pagination::{ListParams, PageSelector, PagedResult, POSTS_PER_PAGE};
pub use post::{CreatePostInput, Post, PostCategory, PostLocation, UpdatePostInput};
pub use session::Session;
pub use user::{UpdateProfileInput, User};
