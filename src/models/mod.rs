//! Data models
//!
//! Database entities (User, Session, Post, Tag, Comment), API inputs and the
//! `PostQuery` description evaluated by the post repository.

mod comment;
mod post;
mod session;
mod tag;
mod user;

pub use comment::{Comment, CommentWithMeta, CreateCommentInput, UpdateCommentInput};
pub use post::{
    CreatePostInput, ListParams, PagedResult, Post, PostEntry, PostOrdering, PostQuery,
    UpdatePostInput, POST_SLUG_MAX_LEN, POST_TITLE_MAX_LEN,
};
pub use session::Session;
pub use tag::{Tag, TagInput, TagWithCount, TAG_TITLE_MAX_LEN};
pub use user::{CreateUserInput, User};
