//! Services layer - Business logic
//!
//! Services validate input, enforce the visibility rules and coordinate the
//! repositories. They return their own error enums; the API layer maps
//! those to HTTP responses.

pub mod category;
pub mod comment;
pub mod location;
pub mod password;
pub mod post;
pub mod user;
pub mod validation;

pub use category::{CategoryService, CategoryServiceError};
pub use comment::{CommentService, CommentServiceError};
pub use location::{LocationService, LocationServiceError};
pub use password::{hash_password, verify_password};
pub use post::{PostService, PostServiceError};
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};
pub use validation::{generate_slug, FieldErrors};
