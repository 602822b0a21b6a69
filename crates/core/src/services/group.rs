//! Group service.

use std::borrow::Cow;

use sea_orm::Set;
use serde::Deserialize;
use validator::{Validate, ValidationError};
use yatube_common::{AppError, AppResult, IdGenerator};
use yatube_db::{entities::group, repositories::GroupRepository};

/// Group service for business logic.
#[derive(Clone)]
pub struct GroupService {
    group_repo: GroupRepository,
    id_gen: IdGenerator,
}

/// Input for creating a group.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupInput {
    #[validate(
        length(min = 1, max = 50, message = "Ensure this value has at most 50 characters."),
        custom(function = "validate_slug")
    )]
    pub slug: String,

    #[validate(length(min = 1, max = 200, message = "Ensure this value has at most 200 characters."))]
    pub title: String,

    #[serde(default)]
    pub description: String,
}

/// ASCII letters, digits, hyphens and underscores.
fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_slug").with_message(Cow::Borrowed(
            "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
        )))
    }
}

impl GroupService {
    /// Create a new group service.
    #[must_use]
    pub fn new(group_repo: GroupRepository) -> Self {
        Self {
            group_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a group. Slugs are unique.
    pub async fn create(&self, input: CreateGroupInput) -> AppResult<group::Model> {
        input.validate()?;

        if self.group_repo.find_by_slug(&input.slug).await?.is_some() {
            return Err(AppError::field(
                "slug",
                "Group with this slug already exists.",
            ));
        }

        let model = group::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            slug: Set(input.slug),
            description: Set(input.description),
            created_at: Set(chrono::Utc::now().into()),
        };

        let group = self.group_repo.create(model).await?;
        tracing::info!(group_id = %group.id, slug = %group.slug, "Created group");
        Ok(group)
    }

    /// Get a group by slug.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<group::Model> {
        self.group_repo.get_by_slug(slug).await
    }

    /// All groups, ordered by title.
    pub async fn list(&self) -> AppResult<Vec<group::Model>> {
        self.group_repo.find_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(db: MockDatabase) -> GroupService {
        GroupService::new(GroupRepository::new(Arc::new(db.into_connection())))
    }

    #[test]
    fn test_slug_validation() {
        assert!(validate_slug("tolstoy-fans_2").is_ok());
        assert!(validate_slug("no spaces").is_err());
        assert!(validate_slug("кириллица").is_err());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_slug() {
        let existing = group::Model {
            id: "g1".to_string(),
            title: "Cats".to_string(),
            slug: "cats".to_string(),
            description: String::new(),
            created_at: Utc::now().into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[existing]]);

        let result = service(db)
            .create(CreateGroupInput {
                slug: "cats".to_string(),
                title: "More cats".to_string(),
                description: String::new(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(e)) if !e.get("slug").is_empty()));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_slug() {
        let result = service(MockDatabase::new(DatabaseBackend::Postgres))
            .create(CreateGroupInput {
                slug: "bad slug".to_string(),
                title: "Bad".to_string(),
                description: String::new(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
