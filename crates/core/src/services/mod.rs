//! Business services.

pub mod comment;
pub mod feed;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

use std::borrow::Cow;

use validator::ValidationError;

pub use comment::{CommentInput, CommentService, CommentWithAuthor};
pub use feed::{FeedPost, FeedService, GroupFeed, ProfileFeed};
pub use follow::{FollowOutcome, FollowService};
pub use group::{CreateGroupInput, GroupService};
pub use post::{EditOutcome, PostDetails, PostInput, PostService};
pub use user::{CreateUserInput, UserService};

/// Rejects empty and whitespace-only values.
pub(crate) fn validate_required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("required").with_message(Cow::Borrowed("This field is required.")))
    } else {
        Ok(())
    }
}
