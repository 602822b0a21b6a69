//! Follow service.

use sea_orm::Set;
use yatube_common::{AppError, AppResult, IdGenerator};
use yatube_db::{
    entities::{follow, user},
    repositories::{FollowRepository, UserRepository},
};

/// Follow service for business logic.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Result of a follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    /// A new edge was created.
    Followed,
    /// The edge already existed; nothing changed.
    AlreadyFollowing,
    /// Users cannot follow themselves; nothing changed.
    SelfFollow,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub fn new(follow_repo: FollowRepository, user_repo: UserRepository) -> Self {
        Self {
            follow_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Follow the author named `target_username`.
    ///
    /// Self-follows and repeats are no-ops. The unique constraint on the
    /// pair still catches a concurrent duplicate, which is reported as
    /// [`FollowOutcome::AlreadyFollowing`].
    pub async fn follow(
        &self,
        user: &user::Model,
        target_username: &str,
    ) -> AppResult<FollowOutcome> {
        let author = self.user_repo.get_by_username(target_username).await?;

        if author.id == user.id {
            return Ok(FollowOutcome::SelfFollow);
        }

        if self.follow_repo.is_following(&user.id, &author.id).await? {
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        let model = follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user.id.clone()),
            author_id: Set(author.id.clone()),
            created_at: Set(chrono::Utc::now().into()),
        };

        match self.follow_repo.create(model).await {
            Ok(_) => {
                tracing::info!(user_id = %user.id, author_id = %author.id, "Followed author");
                Ok(FollowOutcome::Followed)
            }
            Err(AppError::Conflict(msg)) => {
                tracing::debug!(user_id = %user.id, author_id = %author.id, %msg, "Concurrent duplicate follow");
                Ok(FollowOutcome::AlreadyFollowing)
            }
            Err(e) => Err(e),
        }
    }

    /// Stop following the author named `target_username`.
    ///
    /// Returns whether an edge was removed; a missing edge is not an error.
    pub async fn unfollow(&self, user: &user::Model, target_username: &str) -> AppResult<bool> {
        let author = self.user_repo.get_by_username(target_username).await?;
        let removed = self.follow_repo.delete_by_pair(&user.id, &author.id).await?;

        if removed {
            tracing::info!(user_id = %user.id, author_id = %author.id, "Unfollowed author");
        }

        Ok(removed)
    }

    /// Check if a user follows an author.
    pub async fn is_following(&self, user_id: &str, author_id: &str) -> AppResult<bool> {
        self.follow_repo.is_following(user_id, author_id).await
    }

    /// Count authors a user follows.
    pub async fn count_following(&self, user_id: &str) -> AppResult<u64> {
        self.follow_repo.count_following(user_id).await
    }

    /// Count followers of an author.
    pub async fn count_followers(&self, user_id: &str) -> AppResult<u64> {
        self.follow_repo.count_followers(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult, RuntimeErr};
    use std::sync::Arc;

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            name: None,
            password_hash: String::new(),
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_follow(user_id: &str, author_id: &str) -> follow::Model {
        follow::Model {
            id: "f1".to_string(),
            user_id: user_id.to_string(),
            author_id: author_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn service(db: DatabaseConnection) -> FollowService {
        let db = Arc::new(db);
        FollowService::new(
            FollowRepository::new(Arc::clone(&db)),
            UserRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_follow_self_is_noop() {
        let me = create_test_user("u1", "leo");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[me.clone()]])
            .into_connection();

        let outcome = service(db).follow(&me, "leo").await.unwrap();
        assert_eq!(outcome, FollowOutcome::SelfFollow);
    }

    #[tokio::test]
    async fn test_follow_twice_is_noop() {
        let me = create_test_user("u1", "leo");
        let author = create_test_user("u2", "anna");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[author]])
            .append_query_results([[create_test_follow("u1", "u2")]])
            .into_connection();

        let outcome = service(db).follow(&me, "anna").await.unwrap();
        assert_eq!(outcome, FollowOutcome::AlreadyFollowing);
    }

    #[tokio::test]
    async fn test_follow_creates_edge() {
        let me = create_test_user("u1", "leo");
        let author = create_test_user("u2", "anna");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[author]])
            .append_query_results([Vec::<follow::Model>::new()])
            .append_query_results([[create_test_follow("u1", "u2")]])
            .into_connection();

        let outcome = service(db).follow(&me, "anna").await.unwrap();
        assert_eq!(outcome, FollowOutcome::Followed);
    }

    #[tokio::test]
    async fn test_follow_propagates_database_error() {
        let me = create_test_user("u1", "leo");
        let author = create_test_user("u2", "anna");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[author]])
            .append_query_results([Vec::<follow::Model>::new()])
            .append_query_errors([DbErr::Query(RuntimeErr::Internal("boom".to_string()))])
            .into_connection();

        let result = service(db).follow(&me, "anna").await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_follow_unknown_user() {
        let me = create_test_user("u1", "leo");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let result = service(db).follow(&me, "ghost").await;
        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_unfollow_without_edge() {
        let me = create_test_user("u1", "leo");
        let author = create_test_user("u2", "anna");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[author]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        assert!(!service(db).unfollow(&me, "anna").await.unwrap());
    }
}
