//! Comment service.

use std::collections::HashMap;

use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;
use yatube_common::{AppResult, IdGenerator};
use yatube_db::{
    entities::{comment, user},
    repositories::{CommentRepository, PostRepository, UserRepository},
};

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for a new comment.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CommentInput {
    /// Comment body.
    #[validate(custom(function = "crate::services::validate_required"))]
    pub text: String,
}

/// A comment with its author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentWithAuthor {
    /// The comment itself.
    pub comment: comment::Model,
    /// Who wrote it.
    pub author: user::Model,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Comment on a post.
    pub async fn create(
        &self,
        author: &user::Model,
        post_id: &str,
        input: CommentInput,
    ) -> AppResult<comment::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        input.validate()?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id),
            author_id: Set(author.id.clone()),
            text: Set(input.text.trim().to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        let comment = self.comment_repo.create(model).await?;
        tracing::debug!(comment_id = %comment.id, post_id = %comment.post_id, "Created comment");
        Ok(comment)
    }

    /// Comments on a post with their authors, oldest first.
    pub async fn list_for_post(&self, post_id: &str) -> AppResult<Vec<CommentWithAuthor>> {
        let comments = self.comment_repo.find_by_post(post_id).await?;
        if comments.is_empty() {
            return Ok(vec![]);
        }

        let mut author_ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(comments
            .into_iter()
            .filter_map(|comment| {
                let author = authors.get(&comment.author_id).cloned()?;
                Some(CommentWithAuthor { comment, author })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;
    use yatube_common::AppError;
    use yatube_db::entities::post;

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user_{id}"),
            username_lower: format!("user_{id}"),
            name: None,
            password_hash: String::new(),
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_post(id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            text: "A post".to_string(),
            author_id: "u1".to_string(),
            group_id: None,
            image: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_comment(id: &str, author_id: &str) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            post_id: "p1".to_string(),
            author_id: author_id.to_string(),
            text: format!("Comment {id}"),
            created_at: Utc::now().into(),
        }
    }

    fn service(db: DatabaseConnection) -> CommentService {
        let db = Arc::new(db);
        CommentService::new(
            CommentRepository::new(Arc::clone(&db)),
            PostRepository::new(Arc::clone(&db)),
            UserRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_create_on_missing_post() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();

        let result = service(db)
            .create(
                &create_test_user("u1"),
                "nope",
                CommentInput {
                    text: "Hi".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_create_blank_text() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_post("p1")]])
            .into_connection();

        let result = service(db)
            .create(&create_test_user("u1"), "p1", CommentInput::default())
            .await;

        assert!(matches!(result, Err(AppError::Validation(e)) if !e.get("text").is_empty()));
    }

    #[tokio::test]
    async fn test_create_success() {
        let comment = create_test_comment("c1", "u1");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_post("p1")]])
            .append_query_results([[comment.clone()]])
            .into_connection();

        let created = service(db)
            .create(
                &create_test_user("u1"),
                "p1",
                CommentInput {
                    text: "Comment c1".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(created, comment);
    }

    #[tokio::test]
    async fn test_list_for_post_attaches_authors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[
                create_test_comment("c1", "u1"),
                create_test_comment("c2", "u2"),
            ]])
            .append_query_results([[create_test_user("u1"), create_test_user("u2")]])
            .into_connection();

        let comments = service(db).list_for_post("p1").await.unwrap();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].comment.id, "c1");
        assert_eq!(comments[0].author.id, "u1");
        assert_eq!(comments[1].author.id, "u2");
    }
}
