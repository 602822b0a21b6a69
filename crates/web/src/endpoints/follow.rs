//! Follow feed and follow toggles.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::get,
};
use yatube_core::FollowOutcome;

use super::page_ctx;
use crate::{
    error::PageResult,
    extractors::AuthUser,
    forms::PageQuery,
    state::AppState,
    views,
};

const FOLLOW_INDEX: &str = "/follow/";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/follow/", get(follow_index))
        .route("/profile/{username}/follow/", get(profile_follow))
        .route("/profile/{username}/unfollow/", get(profile_unfollow))
}

async fn follow_index(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<PageQuery>,
) -> PageResult<Html<String>> {
    let page = state
        .feed_service
        .follow_feed(&user, query.page.as_deref())
        .await?;
    Ok(Html(views::follow_page(page_ctx(&state, Some(&user)), &page)))
}

async fn profile_follow(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
) -> PageResult<Redirect> {
    let outcome = state.follow_service.follow(&user, &username).await?;
    if outcome != FollowOutcome::Followed {
        tracing::debug!(user_id = %user.id, %username, ?outcome, "Follow was a no-op");
    }
    Ok(Redirect::to(FOLLOW_INDEX))
}

async fn profile_unfollow(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
) -> PageResult<Redirect> {
    state.follow_service.unfollow(&user, &username).await?;
    Ok(Redirect::to(FOLLOW_INDEX))
}
