//! Post repository.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::entities::{Group, Post, User, group, post, user};
use crate::pagination::{Page, fetch_page};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select,
};
use yatube_common::{AppError, AppResult};

/// Which posts a feed lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    /// Every post.
    All,
    /// Posts filed under a group (by group ID).
    Group(String),
    /// Posts by one author (by user ID).
    Author(String),
    /// Posts by any of several authors (by user ID).
    Authors(Vec<String>),
}

impl PostFilter {
    fn apply(self, query: Select<Post>) -> Select<Post> {
        match self {
            Self::All => query,
            Self::Group(group_id) => query.filter(post::Column::GroupId.eq(group_id)),
            Self::Author(author_id) => query.filter(post::Column::AuthorId.eq(author_id)),
            Self::Authors(author_ids) => query.filter(post::Column::AuthorId.is_in(author_ids)),
        }
    }

    fn is_empty_set(&self) -> bool {
        matches!(self, Self::Authors(ids) if ids.is_empty())
    }
}

/// A post together with its author and group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostWithRelations {
    /// The post itself.
    pub post: post::Model,
    /// Its author.
    pub author: user::Model,
    /// Its group, if it has one.
    pub group: Option<group::Model>,
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Posts whose text matches exactly, newest first.
    pub async fn find_by_text(&self, text: &str) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(post::Column::Text.eq(text))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count posts matching a filter.
    pub async fn count(&self, filter: PostFilter) -> AppResult<u64> {
        if filter.is_empty_set() {
            return Ok(0);
        }

        filter
            .apply(Post::find())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch one page of posts matching a filter, newest first.
    ///
    /// Ties on `created_at` are broken by ID, which is itself time-ordered.
    pub async fn find_page(
        &self,
        filter: PostFilter,
        page_size: u64,
        requested: Option<&str>,
    ) -> AppResult<Page<post::Model>> {
        if filter.is_empty_set() {
            return Ok(Page::empty(page_size.max(1)));
        }

        let query = filter
            .apply(Post::find())
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id);

        fetch_page(self.db.as_ref(), query, page_size, requested)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Attach authors and groups to posts, preserving order.
    ///
    /// Runs at most two extra queries regardless of the number of posts.
    pub async fn with_relations(
        &self,
        posts: Vec<post::Model>,
    ) -> AppResult<Vec<PostWithRelations>> {
        if posts.is_empty() {
            return Ok(vec![]);
        }

        let author_ids: Vec<String> = posts
            .iter()
            .map(|p| p.author_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let group_ids: Vec<String> = posts
            .iter()
            .filter_map(|p| p.group_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let authors: HashMap<String, user::Model> = User::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let groups: HashMap<String, group::Model> = if group_ids.is_empty() {
            HashMap::new()
        } else {
            Group::find()
                .filter(group::Column::Id.is_in(group_ids))
                .all(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .into_iter()
                .map(|g| (g.id.clone(), g))
                .collect()
        };

        Ok(posts
            .into_iter()
            .filter_map(|post| {
                let Some(author) = authors.get(&post.author_id).cloned() else {
                    tracing::warn!(post_id = %post.id, "Post author missing, skipping");
                    return None;
                };
                let group = post
                    .group_id
                    .as_ref()
                    .and_then(|id| groups.get(id).cloned());
                Some(PostWithRelations {
                    post,
                    author,
                    group,
                })
            })
            .collect())
    }

    /// Fetch one page of posts with their authors and groups.
    pub async fn find_page_with_relations(
        &self,
        filter: PostFilter,
        page_size: u64,
        requested: Option<&str>,
    ) -> AppResult<Page<PostWithRelations>> {
        let page = self.find_page(filter, page_size, requested).await?;
        let Page {
            items,
            number,
            num_pages,
            total,
            page_size,
        } = page;
        let items = self.with_relations(items).await?;
        Ok(Page {
            items,
            number,
            num_pages,
            total,
            page_size,
        })
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a post. Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn create_test_post(id: &str, author_id: &str, group_id: Option<&str>) -> post::Model {
        post::Model {
            id: id.to_string(),
            text: format!("Post {id}"),
            author_id: author_id.to_string(),
            group_id: group_id.map(ToString::to_string),
            image: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user_{id}"),
            username_lower: format!("user_{id}"),
            name: None,
            password_hash: "hash".to_string(),
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_group(id: &str) -> group::Model {
        group::Model {
            id: id.to_string(),
            title: format!("Group {id}"),
            slug: id.to_string(),
            description: String::new(),
            created_at: Utc::now().into(),
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::PostNotFound(id)) if id == "missing"));
    }

    #[tokio::test]
    async fn test_find_page_second_page() {
        let posts: Vec<post::Model> = (0..4)
            .map(|i| create_test_post(&format!("p{i}"), "u1", None))
            .collect();

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(14)]])
                .append_query_results([posts])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let page = repo.find_page(PostFilter::All, 10, Some("2")).await.unwrap();

        assert_eq!(page.items.len(), 4);
        assert_eq!(page.number, 2);
        assert_eq!(page.num_pages, 2);
        assert_eq!(page.total, 14);
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[tokio::test]
    async fn test_find_page_out_of_range_serves_last() {
        let posts = vec![create_test_post("p1", "u1", None)];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(11)]])
                .append_query_results([posts])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let page = repo.find_page(PostFilter::All, 10, Some("99")).await.unwrap();

        assert_eq!(page.number, 2);
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_find_page_empty_listing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(0)]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let page = repo.find_page(PostFilter::All, 10, Some("3")).await.unwrap();

        assert!(page.is_empty());
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
    }

    #[tokio::test]
    async fn test_find_page_no_authors_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = PostRepository::new(db);
        let page = repo
            .find_page(PostFilter::Authors(vec![]), 10, None)
            .await
            .unwrap();

        assert!(page.is_empty());
        assert_eq!(repo.count(PostFilter::Authors(vec![])).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_with_relations_preserves_order() {
        let posts = vec![
            create_test_post("p2", "u2", Some("g1")),
            create_test_post("p1", "u1", None),
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u1"), create_test_user("u2")]])
                .append_query_results([[create_test_group("g1")]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.with_relations(posts).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].post.id, "p2");
        assert_eq!(result[0].author.id, "u2");
        assert_eq!(result[0].group.as_ref().map(|g| g.id.as_str()), Some("g1"));
        assert_eq!(result[1].author.id, "u1");
        assert!(result[1].group.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert!(repo.delete("p1").await.unwrap());
    }
}
