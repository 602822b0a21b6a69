//! Post service.

use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;
use yatube_common::{AppError, AppResult, FormErrors, IdGenerator};
use yatube_db::{
    entities::{group, post, user},
    repositories::{GroupRepository, PostFilter, PostRepository, UserRepository},
};

use crate::services::comment::{CommentService, CommentWithAuthor};

/// Message for a group ID that does not name an existing group.
pub const INVALID_GROUP_MESSAGE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    group_repo: GroupRepository,
    user_repo: UserRepository,
    comments: CommentService,
    id_gen: IdGenerator,
}

/// Input for creating or editing a post.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PostInput {
    /// Post body.
    #[validate(custom(function = "crate::services::validate_required"))]
    pub text: String,

    /// Group ID; empty means "no group".
    pub group_id: Option<String>,

    /// Storage key of an already stored image.
    pub image: Option<String>,
}

/// Result of an edit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The author edited the post; carries the new state.
    Updated(post::Model),
    /// Someone else tried; the post is returned untouched.
    NotAuthor(post::Model),
}

/// Everything the post detail page shows.
#[derive(Debug, Clone)]
pub struct PostDetails {
    /// The post itself.
    pub post: post::Model,
    /// Its author.
    pub author: user::Model,
    /// Its group, if any.
    pub group: Option<group::Model>,
    /// Number of posts by the same author.
    pub author_post_count: u64,
    /// Comments, oldest first.
    pub comments: Vec<CommentWithAuthor>,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        group_repo: GroupRepository,
        user_repo: UserRepository,
        comments: CommentService,
    ) -> Self {
        Self {
            post_repo,
            group_repo,
            user_repo,
            comments,
            id_gen: IdGenerator::new(),
        }
    }

    /// Validate input and resolve its group.
    ///
    /// All field errors are collected before returning.
    async fn check_input(&self, input: &PostInput) -> AppResult<Option<String>> {
        let mut errors = match input.validate() {
            Ok(()) => FormErrors::default(),
            Err(e) => FormErrors::from(e),
        };

        let group_id = match input
            .group_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            None => None,
            Some(id) => match self.group_repo.find_by_id(id).await? {
                Some(group) => Some(group.id),
                None => {
                    errors.add("group", INVALID_GROUP_MESSAGE);
                    None
                }
            },
        };

        errors.into_result()?;
        Ok(group_id)
    }

    /// Create a post authored by `author`.
    pub async fn create(&self, author: &user::Model, input: PostInput) -> AppResult<post::Model> {
        let group_id = self.check_input(&input).await?;

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            text: Set(input.text.trim().to_string()),
            author_id: Set(author.id.clone()),
            group_id: Set(group_id),
            image: Set(input.image),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let post = self.post_repo.create(model).await?;
        tracing::info!(post_id = %post.id, author_id = %author.id, "Created post");
        Ok(post)
    }

    /// Edit a post. Only its author may; anyone else gets
    /// [`EditOutcome::NotAuthor`] and nothing changes.
    ///
    /// The current image is kept unless the input carries a new one.
    pub async fn update(
        &self,
        editor: &user::Model,
        post_id: &str,
        input: PostInput,
    ) -> AppResult<EditOutcome> {
        let post = self.post_repo.get_by_id(post_id).await?;

        if post.author_id != editor.id {
            tracing::debug!(post_id = %post.id, editor_id = %editor.id, "Edit by non-author ignored");
            return Ok(EditOutcome::NotAuthor(post));
        }

        let group_id = self.check_input(&input).await?;

        let mut active: post::ActiveModel = post.into();
        active.text = Set(input.text.trim().to_string());
        active.group_id = Set(group_id);
        if let Some(image) = input.image {
            active.image = Set(Some(image));
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let updated = self.post_repo.update(active).await?;
        Ok(EditOutcome::Updated(updated))
    }

    /// Get a post by ID.
    pub async fn get(&self, id: &str) -> AppResult<post::Model> {
        self.post_repo.get_by_id(id).await
    }

    /// Get a post with its author, group, comments and the author's post count.
    pub async fn get_with_details(&self, id: &str) -> AppResult<PostDetails> {
        let post = self.post_repo.get_by_id(id).await?;
        let author = self.user_repo.get_by_id(&post.author_id).await?;
        let group = match post.group_id.as_deref() {
            Some(group_id) => self.group_repo.find_by_id(group_id).await?,
            None => None,
        };
        let author_post_count = self
            .post_repo
            .count(PostFilter::Author(author.id.clone()))
            .await?;
        let comments = self.comments.list_for_post(&post.id).await?;

        Ok(PostDetails {
            post,
            author,
            group,
            author_post_count,
            comments,
        })
    }

    /// Delete a post. Only its author may. Returns the deleted post.
    pub async fn delete(&self, user: &user::Model, id: &str) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(id).await?;

        if post.author_id != user.id {
            return Err(AppError::Forbidden(
                "Only the author can delete this post".to_string(),
            ));
        }

        self.post_repo.delete(&post.id).await?;
        tracing::info!(post_id = %post.id, "Deleted post");
        Ok(post)
    }

    /// Total number of posts.
    pub async fn count(&self) -> AppResult<u64> {
        self.post_repo.count(PostFilter::All).await
    }

    /// Posts with exactly this text, newest first.
    pub async fn find_by_text(&self, text: &str) -> AppResult<Vec<post::Model>> {
        self.post_repo.find_by_text(text).await
    }
}
