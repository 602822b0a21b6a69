//! HTTP layer for yatube-rs.
//!
//! Server-rendered pages over axum:
//!
//! - **Endpoints**: feeds, posts, comments, follows and sign-in
//! - **Extractors**: the signed-in user, or a redirect to login
//! - **Middleware**: session resolution and the home page cache
//! - **Views**: HTML rendering with escaping
//!
//! [`app`] assembles everything into a router ready to serve.

pub mod cache;
pub mod endpoints;
pub mod error;
pub mod extractors;
pub mod forms;
pub mod middleware;
pub mod state;
pub mod views;

use axum::{Router, http::StatusCode, response::Html};
use tower_http::services::ServeDir;

pub use cache::{CacheStore, MemoryCacheStore, RedisCacheStore};
pub use error::{PageError, PageResult};
pub use state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let mut router = endpoints::router(&state);

    let media = &state.config.media;
    if media.base_url.starts_with('/') && media.base_url.len() > 1 {
        router = router.nest_service(
            media.base_url.trim_end_matches('/'),
            ServeDir::new(&media.base_path),
        );
    }

    router
        .fallback(not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .with_state(state)
}

async fn not_found() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html(views::not_found_page()))
}
