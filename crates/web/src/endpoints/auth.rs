//! Sign-up, login and logout.

use axum::{
    Form, Router,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use yatube_common::{AppError, FormErrors};
use yatube_core::CreateUserInput;

use crate::{
    error::PageResult,
    extractors::{MaybeAuthUser, safe_next},
    forms::{LoginForm, NextQuery, SignupForm},
    state::AppState,
    views,
};

const LOGIN_FAILED: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup/", get(signup_form).post(signup))
        .route("/auth/login/", get(login_form).post(login))
        .route("/auth/logout/", get(logout).post(logout))
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((state.config.auth.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.auth.cookie_secure)
        .build()
}

async fn signup_form() -> Html<String> {
    Html(views::signup_page("", "", &FormErrors::default()))
}

async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> PageResult<Response> {
    let errors = form.check();
    if !errors.is_empty() {
        return Ok(Html(views::signup_page(&form.username, &form.name, &errors)).into_response());
    }

    let input = CreateUserInput {
        username: form.username.trim().to_string(),
        password: form.password1.clone(),
        name: Some(form.name.clone()),
    };

    match state.user_service.create(input).await {
        Ok(user) => {
            let Some(token) = user.token else {
                return Err(AppError::Internal("new user has no session token".to_string()).into());
            };
            Ok((jar.add(session_cookie(&state, token)), Redirect::to("/")).into_response())
        }
        Err(AppError::Validation(errors)) => {
            Ok(Html(views::signup_page(&form.username, &form.name, &errors)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn login_form(Query(query): Query<NextQuery>) -> Html<String> {
    Html(views::login_page("", query.next.as_deref(), None))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> PageResult<Response> {
    match state
        .user_service
        .authenticate(form.username.trim(), &form.password)
        .await
    {
        Ok(user) => {
            let Some(token) = user.token else {
                return Err(AppError::Internal("authenticated user has no token".to_string()).into());
            };
            tracing::info!(user_id = %user.id, "User logged in");
            let next = safe_next(form.next.as_deref()).to_string();
            Ok((jar.add(session_cookie(&state, token)), Redirect::to(&next)).into_response())
        }
        Err(AppError::Unauthorized) => Ok(Html(views::login_page(
            &form.username,
            form.next.as_deref(),
            Some(LOGIN_FAILED),
        ))
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Log out everywhere by rotating the token, and drop the cookie.
async fn logout(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    jar: CookieJar,
) -> PageResult<(CookieJar, Redirect)> {
    if let Some(user) = viewer {
        state.user_service.regenerate_token(&user.id).await?;
        tracing::info!(user_id = %user.id, "User logged out");
    }

    let removal = Cookie::build((state.config.auth.cookie_name.clone(), "")).path("/");
    Ok((jar.remove(removal), Redirect::to("/")))
}
