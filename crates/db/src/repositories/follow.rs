//! Follow repository.

use std::sync::Arc;

use crate::entities::{Follow, follow};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, SqlErr,
};
use yatube_common::{AppError, AppResult};

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

/// Unique-constraint hits become `Conflict` so callers can tell a concurrent
/// duplicate apart from a real failure.
fn map_insert_err(e: &DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => AppError::Conflict(msg),
        _ => AppError::Database(e.to_string()),
    }
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a follow edge by follower and author.
    pub async fn find_by_pair(
        &self,
        user_id: &str,
        author_id: &str,
    ) -> AppResult<Option<follow::Model>> {
        Follow::find()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user follows an author.
    pub async fn is_following(&self, user_id: &str, author_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(user_id, author_id).await?.is_some())
    }

    /// Create a follow edge.
    ///
    /// A duplicate `(user_id, author_id)` pair yields [`AppError::Conflict`].
    pub async fn create(&self, model: follow::ActiveModel) -> AppResult<follow::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_insert_err(&e))
    }

    /// Delete a follow edge by pair. Returns whether an edge was removed.
    pub async fn delete_by_pair(&self, user_id: &str, author_id: &str) -> AppResult<bool> {
        let result = Follow::delete_many()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// IDs of every author a user follows, most recently followed first.
    pub async fn find_author_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        let follows = Follow::find()
            .filter(follow::Column::UserId.eq(user_id))
            .order_by_desc(follow::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(follows.into_iter().map(|f| f.author_id).collect())
    }

    /// Count authors a user follows.
    pub async fn count_following(&self, user_id: &str) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count followers of an author.
    pub async fn count_followers(&self, author_id: &str) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count every follow edge.
    pub async fn count(&self) -> AppResult<u64> {
        Follow::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
