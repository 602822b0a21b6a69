//! Feed service.
//!
//! Every feed is a newest-first, paginated listing of posts with their
//! authors and groups; they differ only in the filter applied.

use yatube_common::AppResult;
use yatube_db::{
    Page,
    entities::{group, user},
    repositories::{
        FollowRepository, GroupRepository, PostFilter, PostRepository, PostWithRelations,
        UserRepository,
    },
};

/// A post as listed in a feed.
pub type FeedPost = PostWithRelations;

/// A group's feed.
#[derive(Debug, Clone)]
pub struct GroupFeed {
    /// The group.
    pub group: group::Model,
    /// One page of its posts.
    pub page: Page<FeedPost>,
}

/// An author's profile feed.
#[derive(Debug, Clone)]
pub struct ProfileFeed {
    /// The author.
    pub author: user::Model,
    /// One page of the author's posts.
    pub page: Page<FeedPost>,
    /// Whether the viewer follows the author; false for anonymous viewers.
    pub following: bool,
    /// Number of followers the author has.
    pub followers_count: u64,
    /// Number of authors the author follows.
    pub following_count: u64,
}

impl ProfileFeed {
    /// Total number of posts by the author.
    #[must_use]
    pub const fn post_count(&self) -> u64 {
        self.page.total
    }
}

/// Feed service for assembling listings.
#[derive(Clone)]
pub struct FeedService {
    post_repo: PostRepository,
    group_repo: GroupRepository,
    user_repo: UserRepository,
    follow_repo: FollowRepository,
    page_size: u64,
}

impl FeedService {
    /// Create a new feed service serving pages of `page_size` posts.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        group_repo: GroupRepository,
        user_repo: UserRepository,
        follow_repo: FollowRepository,
        page_size: u64,
    ) -> Self {
        Self {
            post_repo,
            group_repo,
            user_repo,
            follow_repo,
            page_size: page_size.max(1),
        }
    }

    /// Posts per page.
    #[must_use]
    pub const fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Every post.
    pub async fn home(&self, page: Option<&str>) -> AppResult<Page<FeedPost>> {
        self.post_repo
            .find_page_with_relations(PostFilter::All, self.page_size, page)
            .await
    }

    /// Posts filed under the group with this slug.
    pub async fn group(&self, slug: &str, page: Option<&str>) -> AppResult<GroupFeed> {
        let group = self.group_repo.get_by_slug(slug).await?;
        let page = self
            .post_repo
            .find_page_with_relations(PostFilter::Group(group.id.clone()), self.page_size, page)
            .await?;

        Ok(GroupFeed { group, page })
    }

    /// Posts by the author with this username.
    pub async fn profile(
        &self,
        username: &str,
        page: Option<&str>,
        viewer: Option<&user::Model>,
    ) -> AppResult<ProfileFeed> {
        let author = self.user_repo.get_by_username(username).await?;
        let page = self
            .post_repo
            .find_page_with_relations(PostFilter::Author(author.id.clone()), self.page_size, page)
            .await?;

        let following = match viewer {
            Some(viewer) if viewer.id != author.id => {
                self.follow_repo.is_following(&viewer.id, &author.id).await?
            }
            _ => false,
        };
        let followers_count = self.follow_repo.count_followers(&author.id).await?;
        let following_count = self.follow_repo.count_following(&author.id).await?;

        Ok(ProfileFeed {
            author,
            page,
            following,
            followers_count,
            following_count,
        })
    }

    /// Posts by every author `user` follows. Following nobody yields an
    /// empty page.
    pub async fn follow_feed(
        &self,
        user: &user::Model,
        page: Option<&str>,
    ) -> AppResult<Page<FeedPost>> {
        let author_ids = self.follow_repo.find_author_ids(&user.id).await?;
        self.post_repo
            .find_page_with_relations(PostFilter::Authors(author_ids), self.page_size, page)
            .await
    }
}
