//! Test utilities for database operations.
//!
//! [`TestDatabase`] opens a private in-memory SQLite database with every
//! migration applied, plus fixture helpers for the rows most tests need.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing::debug;
use yatube_common::{AppError, AppResult, Config, IdGenerator};

use crate::entities::{comment, follow, group, post, user};

/// In-memory SQLite URL; every connection gets its own database.
pub const SQLITE_MEMORY_URL: &str = "sqlite::memory:";

/// Fixture timestamps start here and move forward one second per post.
const FIXTURE_EPOCH: i64 = 1_735_689_600;

/// A migrated, throwaway database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
    clock: AtomicI64,
}

impl TestDatabase {
    /// Open a fresh in-memory database and run all migrations.
    pub async fn new() -> AppResult<Self> {
        let config = Config::for_database(SQLITE_MEMORY_URL);
        let conn = crate::init(&config).await?;
        crate::migrate(&conn).await?;

        debug!("Created in-memory test database");

        Ok(Self {
            conn: Arc::new(conn),
            id_gen: IdGenerator::new(),
            clock: AtomicI64::new(FIXTURE_EPOCH),
        })
    }

    /// Shared handle to the connection.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Next fixture timestamp. Whole seconds keep SQLite's text ordering
    /// consistent with time ordering.
    fn tick(&self) -> AppResult<DateTime<Utc>> {
        let secs = self.clock.fetch_add(1, Ordering::SeqCst);
        DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| AppError::Internal(format!("invalid fixture timestamp {secs}")))
    }

    /// Insert a user with a fixed session token of `token-<username>`.
    pub async fn create_user(&self, username: &str) -> AppResult<user::Model> {
        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(username.to_string()),
            username_lower: Set(username.to_lowercase()),
            name: Set(None),
            password_hash: Set("!".to_string()),
            token: Set(Some(format!("token-{username}"))),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        model
            .insert(self.conn.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a group.
    pub async fn create_group(&self, slug: &str, title: &str) -> AppResult<group::Model> {
        let model = group::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(title.to_string()),
            slug: Set(slug.to_string()),
            description: Set(format!("About {title}")),
            created_at: Set(Utc::now().into()),
        };
        model
            .insert(self.conn.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a post. Each call is stamped one second after the previous
    /// fixture post, so the last one created is the newest.
    pub async fn create_post(
        &self,
        author: &user::Model,
        text: &str,
        group: Option<&group::Model>,
    ) -> AppResult<post::Model> {
        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            text: Set(text.to_string()),
            author_id: Set(author.id.clone()),
            group_id: Set(group.map(|g| g.id.clone())),
            image: Set(None),
            created_at: Set(self.tick()?.into()),
            updated_at: Set(None),
        };
        model
            .insert(self.conn.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a comment.
    pub async fn create_comment(
        &self,
        author: &user::Model,
        post: &post::Model,
        text: &str,
    ) -> AppResult<comment::Model> {
        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id.clone()),
            author_id: Set(author.id.clone()),
            text: Set(text.to_string()),
            created_at: Set(self.tick()?.into()),
        };
        model
            .insert(self.conn.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a follow edge without any of the service-level checks.
    pub async fn create_follow(
        &self,
        user: &user::Model,
        author: &user::Model,
    ) -> AppResult<follow::Model> {
        let model = follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user.id.clone()),
            author_id: Set(author.id.clone()),
            created_at: Set(Utc::now().into()),
        };
        model
            .insert(self.conn.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_clock_moves_forward() {
        let db = TestDatabase::new().await.unwrap();
        let first = db.tick().unwrap();
        let second = db.tick().unwrap();
        assert_eq!((second - first).num_seconds(), 1);
    }
}
