//! Services layer - Business logic
//!
//! Services are responsible for:
//! - Implementing business rules (staff authors, required tags, unique slugs)
//! - Coordinating between repositories and cache
//! - Handling validation and error cases

pub mod comment;
pub mod password;
pub mod post;
pub mod tag;
pub mod user;

pub use comment::{CommentService, CommentServiceError};
pub use password::{hash_password, verify_password};
pub use post::{PostDetail, PostService, PostServiceError};
pub use tag::{TagService, TagServiceError};
pub use user::{UserService, UserServiceError};
