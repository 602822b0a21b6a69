//! Group repository.

use std::sync::Arc;

use crate::entities::{Group, group};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use yatube_common::{AppError, AppResult};

/// Group repository for database operations.
#[derive(Clone)]
pub struct GroupRepository {
    db: Arc<DatabaseConnection>,
}

impl GroupRepository {
    /// Create a new group repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a group by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<group::Model>> {
        Group::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find groups by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<group::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Group::find()
            .filter(group::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a group by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<group::Model>> {
        Group::find()
            .filter(group::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a group by slug, returning an error if not found.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<group::Model> {
        self.find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::GroupNotFound(slug.to_string()))
    }

    /// All groups ordered by title, for the post form's choices.
    pub async fn find_all(&self) -> AppResult<Vec<group::Model>> {
        Group::find()
            .order_by_asc(group::Column::Title)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new group.
    pub async fn create(&self, model: group::ActiveModel) -> AppResult<group::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_group(id: &str, slug: &str) -> group::Model {
        group::Model {
            id: id.to_string(),
            title: format!("Group {slug}"),
            slug: slug.to_string(),
            description: String::new(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_slug_found() {
        let group = create_test_group("g1", "cats");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[group.clone()]])
                .into_connection(),
        );

        let repo = GroupRepository::new(db);
        let result = repo.get_by_slug("cats").await.unwrap();

        assert_eq!(result, group);
    }

    #[tokio::test]
    async fn test_get_by_slug_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<group::Model>::new()])
                .into_connection(),
        );

        let repo = GroupRepository::new(db);
        let result = repo.get_by_slug("dogs").await;

        assert!(matches!(result, Err(AppError::GroupNotFound(slug)) if slug == "dogs"));
    }

    #[tokio::test]
    async fn test_find_all() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "a"), create_test_group("g2", "b")]])
                .into_connection(),
        );

        let repo = GroupRepository::new(db);
        let result = repo.find_all().await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
