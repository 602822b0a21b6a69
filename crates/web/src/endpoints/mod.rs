//! Page endpoints.

mod auth;
mod follow;
mod posts;

use axum::{Router, extract::DefaultBodyLimit, middleware, routing::get};
use yatube_db::entities::user;

use crate::{cache::cache_page, state::AppState, views::PageContext};

/// Extra room for the text fields around an uploaded image.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the page router.
///
/// Only the home feed goes through the page cache.
pub fn router(state: &AppState) -> Router<AppState> {
    let cached = Router::new()
        .route("/", get(posts::index))
        .route_layer(middleware::from_fn_with_state(state.clone(), cache_page));

    let upload_limit = state.config.media.max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .merge(cached)
        .merge(posts::router().layer(DefaultBodyLimit::max(upload_limit)))
        .merge(follow::router())
        .merge(auth::router())
}

fn page_ctx<'a>(state: &'a AppState, viewer: Option<&'a user::Model>) -> PageContext<'a> {
    PageContext {
        viewer,
        media: state.storage.as_ref(),
    }
}

/// Location of a profile page, safe for a `Location` header.
fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

fn post_url(post_id: &str) -> String {
    format!("/posts/{}/", urlencoding::encode(post_id))
}
