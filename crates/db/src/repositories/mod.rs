//! Database repositories.
//!
//! One repository per entity, each wrapping a shared connection and mapping
//! database failures into [`yatube_common::AppError`].

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use comment::CommentRepository;
pub use follow::FollowRepository;
pub use group::GroupRepository;
pub use post::{PostFilter, PostRepository, PostWithRelations};
pub use user::UserRepository;
