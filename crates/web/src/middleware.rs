//! Request middleware.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::state::AppState;

/// Resolve the viewer for every request.
///
/// The session token is read from the session cookie, or from an
/// `Authorization: Bearer` header. A valid token puts the user model into the
/// request extensions; anything else leaves the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = session_token(&req, &state.config.auth.cookie_name);

    if let Some(token) = token {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Failed to resolve session");
            }
            Err(_) => {
                tracing::debug!("Ignoring unknown session token");
            }
        }
    }

    next.run(req).await
}

fn session_token(req: &Request<Body>, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(req.headers());
    if let Some(cookie) = jar.get(cookie_name)
        && !cookie.value().is_empty()
    {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
}
