//! Rendered-page cache.
//!
//! The home feed is served from here for a short while after it was
//! rendered, so a page can lag behind the database until its entry expires.
//! Entries are keyed by URI and viewer; nothing invalidates them early.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    body::{Body, to_bytes},
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use yatube_common::{AppError, AppResult};
use yatube_db::entities::user;

use crate::state::AppState;

/// Header telling whether a page came from the cache.
pub const CACHE_HEADER: &str = "x-cache";

/// Largest page the cache will store; bigger pages are served uncached.
pub const MAX_CACHED_BODY: usize = 4 * 1024 * 1024;

/// Storage for rendered pages.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a live entry.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Store an entry for `ttl`.
    async fn set(&self, key: &str, body: String, ttl: Duration) -> AppResult<()>;
}

#[derive(Debug, Clone)]
struct Entry {
    body: String,
    expires_at: Instant,
}

/// In-process cache store.
#[derive(Clone, Default)]
pub struct MemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryCacheStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry.
    pub async fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.write().await.retain(|_, e| e.expires_at > now);
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.body.clone()))
    }

    async fn set(&self, key: &str, body: String, ttl: Duration) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();

        // Keep the map from growing with pages nobody asks for again
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                body,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }
}

/// Redis cache store, shared by every server process.
#[derive(Clone)]
pub struct RedisCacheStore {
    redis: Arc<RedisClient>,
    prefix: String,
}

impl RedisCacheStore {
    /// Create a store writing keys under `prefix`.
    #[must_use]
    pub fn new(redis: Arc<RedisClient>, prefix: impl Into<String>) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.redis
            .get::<Option<String>, _>(self.key(key))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))
    }

    async fn set(&self, key: &str, body: String, ttl: Duration) -> AppResult<()> {
        let secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX).max(1);
        self.redis
            .set::<(), _, _>(self.key(key), body, Some(Expiration::EX(secs)), None, false)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))
    }
}

/// Cache key for a page as seen by a viewer.
#[must_use]
pub fn page_key(uri: &str, viewer: Option<&user::Model>) -> String {
    let viewer = viewer.map_or("anonymous", |u| u.id.as_str());
    format!("page:{viewer}:{uri}")
}

/// Serve GET responses from the page cache, storing fresh 200s.
///
/// Cache failures are logged and the page is rendered as if uncached.
pub async fn cache_page(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    if req.method() != Method::GET {
        return next.run(req).await;
    }

    let key = page_key(&req.uri().to_string(), req.extensions().get::<user::Model>());

    match state.page_cache.get(&key).await {
        Ok(Some(body)) => {
            debug!(%key, "Page cache hit");
            let mut response = Html(body).into_response();
            response
                .headers_mut()
                .insert(CACHE_HEADER, HeaderValue::from_static("HIT"));
            return response;
        }
        Ok(None) => debug!(%key, "Page cache miss"),
        Err(e) => warn!(error = %e, "Page cache read failed"),
    }

    let response = next.run(req).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (mut parts, body) = response.into_parts();

    // Handlers render the whole page up front, so buffering adds no copy
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Failed to buffer page for caching");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if bytes.len() > MAX_CACHED_BODY {
        debug!(%key, size = bytes.len(), "Page too large to cache");
    } else if let Ok(text) = std::str::from_utf8(&bytes) {
        let ttl = Duration::from_secs(state.config.cache.index_ttl_secs);
        if let Err(e) = state.page_cache.set(&key, text.to_string(), ttl).await {
            warn!(error = %e, "Page cache write failed");
        }
    }

    parts
        .headers
        .insert(CACHE_HEADER, HeaderValue::from_static("MISS"));
    Response::from_parts(parts, Body::from(bytes))
}
