//! Shared application state.

#![allow(missing_docs)]

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use yatube_common::{Config, StorageBackend};
use yatube_core::{
    CommentService, FeedService, FollowService, GroupService, PostService, UserService,
};
use yatube_db::repositories::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};

use crate::cache::CacheStore;

/// Application state handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub group_service: GroupService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub follow_service: FollowService,
    pub feed_service: FeedService,
    /// Where uploaded post images go.
    pub storage: Arc<dyn StorageBackend>,
    /// Rendered-page cache for the home feed.
    pub page_cache: Arc<dyn CacheStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire repositories and services over one connection.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: Config,
        storage: Arc<dyn StorageBackend>,
        page_cache: Arc<dyn CacheStore>,
    ) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let group_repo = GroupRepository::new(Arc::clone(&db));
        let post_repo = PostRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let follow_repo = FollowRepository::new(db);

        let comment_service =
            CommentService::new(comment_repo, post_repo.clone(), user_repo.clone());
        let post_service = PostService::new(
            post_repo.clone(),
            group_repo.clone(),
            user_repo.clone(),
            comment_service.clone(),
        );
        let feed_service = FeedService::new(
            post_repo,
            group_repo.clone(),
            user_repo.clone(),
            follow_repo.clone(),
            config.feed.page_size,
        );

        Self {
            user_service: UserService::new(user_repo.clone()),
            group_service: GroupService::new(group_repo),
            post_service,
            comment_service,
            follow_service: FollowService::new(follow_repo, user_repo),
            feed_service,
            storage,
            page_cache,
            config: Arc::new(config),
        }
    }
}
