//! Error pages.
//!
//! Handlers that need a login reject anonymous visitors through
//! [`AuthUser`](crate::extractors::AuthUser), which redirects to the
//! configured login page. An [`AppError`] reaching this point is rendered.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use yatube_common::AppError;

use crate::views;

/// An [`AppError`] on its way to becoming an HTML response.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl PageError {
    /// Shorthand for a plain 404.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self(AppError::NotFound(what.into()))
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = err.status_code();

        if err.is_server_error() {
            tracing::error!(error = %err, code = err.error_code(), "Request failed");
        } else {
            tracing::debug!(error = %err, code = err.error_code(), "Client error");
        }

        match status {
            StatusCode::NOT_FOUND => (status, Html(views::not_found_page())).into_response(),
            _ => (status, Html(views::error_page(status))).into_response(),
        }
    }
}

/// Result type for page handlers.
pub type PageResult<T> = Result<T, PageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_renders_page() {
        let response = PageError(AppError::PostNotFound("p1".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unauthorized_renders_error_page() {
        let response = PageError(AppError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get("location").is_none());
    }

    #[test]
    fn test_server_error_hides_details() {
        let response = PageError(AppError::Database("secret".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
