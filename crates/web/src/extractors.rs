//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::Redirect,
};
use yatube_db::entities::user;

use crate::state::AppState;

/// Authenticated user extractor.
///
/// Anonymous requests are redirected to the login page with the current
/// path and query in `next`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                let next = parts
                    .uri
                    .path_and_query()
                    .map_or("/", axum::http::uri::PathAndQuery::as_str);
                Redirect::to(&login_url_with_next(&state.config.auth.login_url, next))
            })
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

/// Login URL carrying `next`, with `/` left readable.
#[must_use]
pub fn login_url_with_next(login_url: &str, next: &str) -> String {
    let encoded = urlencoding::encode(next).replace("%2F", "/");
    format!("{login_url}?next={encoded}")
}

/// Where to go after login: `next` when it is a local path, `/` otherwise.
#[must_use]
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
        _ => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_url_with_next_keeps_slashes() {
        assert_eq!(
            login_url_with_next("/auth/login/", "/create/"),
            "/auth/login/?next=/create/"
        );
        assert_eq!(
            login_url_with_next("/auth/login/", "/follow/?page=2"),
            "/auth/login/?next=/follow/%3Fpage%3D2"
        );
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/posts/1/")), "/posts/1/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
