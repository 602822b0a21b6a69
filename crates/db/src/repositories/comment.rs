//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, comment};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use yatube_common::{AppError, AppResult};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Comments on a post, oldest first.
    pub async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count comments on a post.
    pub async fn count_by_post(&self, post_id: &str) -> AppResult<u64> {
        Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, Set};

    fn create_test_comment(id: &str, post_id: &str) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            post_id: post_id.to_string(),
            author_id: "u1".to_string(),
            text: "Nice post".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_post() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_comment("c1", "p1"),
                    create_test_comment("c2", "p1"),
                ]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let result = repo.find_by_post("p1").await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "c1");
    }

    #[tokio::test]
    async fn test_create() {
        let comment = create_test_comment("c1", "p1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[comment.clone()]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let active = comment::ActiveModel {
            id: Set(comment.id.clone()),
            post_id: Set(comment.post_id.clone()),
            author_id: Set(comment.author_id.clone()),
            text: Set(comment.text.clone()),
            created_at: Set(comment.created_at),
        };
        let created = repo.create(active).await.unwrap();

        assert_eq!(created, comment);
    }
}
