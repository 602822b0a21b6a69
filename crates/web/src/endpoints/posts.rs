//! Feed and post endpoints.

use axum::{
    Form, Router,
    extract::{Multipart, Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use yatube_common::{AppError, FormErrors, generate_storage_key};
use yatube_core::{CommentInput, EditOutcome, PostInput};
use yatube_db::entities::user;

use super::{page_ctx, post_url, profile_url};
use crate::{
    error::{PageError, PageResult},
    extractors::{AuthUser, MaybeAuthUser},
    forms::{CommentForm, PageQuery, PostForm},
    state::AppState,
    views::{self, PostFormView},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route("/posts/{post_id}/", get(post_detail))
        .route("/create/", get(create_form).post(create_post))
        .route("/posts/{post_id}/edit/", get(edit_form).post(edit_post))
        .route("/posts/{post_id}/comment/", post(add_comment))
        .route("/posts/{post_id}/delete/", post(delete_post))
}

/// Home feed.
pub async fn index(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(query): Query<PageQuery>,
) -> PageResult<Html<String>> {
    let page = state.feed_service.home(query.page.as_deref()).await?;
    Ok(Html(views::index_page(
        page_ctx(&state, viewer.as_ref()),
        &page,
    )))
}

async fn group_posts(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> PageResult<Html<String>> {
    let feed = state
        .feed_service
        .group(&slug, query.page.as_deref())
        .await?;
    Ok(Html(views::group_page(
        page_ctx(&state, viewer.as_ref()),
        &feed,
    )))
}

async fn profile(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> PageResult<Html<String>> {
    let feed = state
        .feed_service
        .profile(&username, query.page.as_deref(), viewer.as_ref())
        .await?;
    Ok(Html(views::profile_page(
        page_ctx(&state, viewer.as_ref()),
        &feed,
    )))
}

async fn post_detail(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(post_id): Path<String>,
) -> PageResult<Html<String>> {
    let details = state.post_service.get_with_details(&post_id).await?;
    Ok(Html(views::post_detail_page(
        page_ctx(&state, viewer.as_ref()),
        &details,
    )))
}

async fn create_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> PageResult<Html<String>> {
    let errors = FormErrors::default();
    let form = PostFormView {
        text: "",
        group_id: None,
        errors: &errors,
        post_id: None,
    };
    render_form(&state, &user, &form).await
}

async fn create_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> PageResult<Response> {
    let (form, errors) =
        PostForm::from_multipart(multipart, state.config.media.max_upload_bytes).await?;
    if !errors.is_empty() {
        return rerender(&state, &user, &form, errors, None).await;
    }

    let image = store_image(&state, &user, &form).await?;
    let input = PostInput {
        text: form.text.clone(),
        group_id: form.group_id(),
        image: image.clone(),
    };

    match state.post_service.create(&user, input).await {
        Ok(_) => Ok(Redirect::to(&profile_url(&user.username)).into_response()),
        Err(AppError::Validation(errors)) => {
            discard_image(&state, image.as_deref()).await;
            rerender(&state, &user, &form, errors, None).await
        }
        Err(e) => {
            discard_image(&state, image.as_deref()).await;
            Err(e.into())
        }
    }
}

async fn edit_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
) -> PageResult<Response> {
    let post = state.post_service.get(&post_id).await?;
    if post.author_id != user.id {
        return Ok(Redirect::to(&post_url(&post.id)).into_response());
    }

    let errors = FormErrors::default();
    let form = PostFormView {
        text: &post.text,
        group_id: post.group_id.as_deref(),
        errors: &errors,
        post_id: Some(&post.id),
    };
    Ok(render_form(&state, &user, &form).await?.into_response())
}

async fn edit_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
    multipart: Multipart,
) -> PageResult<Response> {
    let post = state.post_service.get(&post_id).await?;
    if post.author_id != user.id {
        return Ok(Redirect::to(&post_url(&post.id)).into_response());
    }

    let (form, errors) =
        PostForm::from_multipart(multipart, state.config.media.max_upload_bytes).await?;
    if !errors.is_empty() {
        return rerender(&state, &user, &form, errors, Some(&post.id)).await;
    }

    let image = store_image(&state, &user, &form).await?;
    let input = PostInput {
        text: form.text.clone(),
        group_id: form.group_id(),
        image: image.clone(),
    };

    match state.post_service.update(&user, &post.id, input).await {
        Ok(EditOutcome::Updated(updated)) => {
            // The old image is no longer referenced
            if image.is_some() && post.image != updated.image {
                discard_image(&state, post.image.as_deref()).await;
            }
            Ok(Redirect::to(&post_url(&updated.id)).into_response())
        }
        Ok(EditOutcome::NotAuthor(post)) => {
            discard_image(&state, image.as_deref()).await;
            Ok(Redirect::to(&post_url(&post.id)).into_response())
        }
        Err(AppError::Validation(errors)) => {
            discard_image(&state, image.as_deref()).await;
            rerender(&state, &user, &form, errors, Some(&post.id)).await
        }
        Err(e) => {
            discard_image(&state, image.as_deref()).await;
            Err(e.into())
        }
    }
}

/// Add a comment. Invalid comments are dropped without a message.
async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> PageResult<Redirect> {
    let input = CommentInput { text: form.text };
    match state.comment_service.create(&user, &post_id, input).await {
        Ok(_) => {}
        Err(AppError::Validation(errors)) => {
            tracing::debug!(%post_id, %errors, "Dropped invalid comment");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to(&post_url(&post_id)))
}

async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
) -> PageResult<Redirect> {
    let post = state.post_service.delete(&user, &post_id).await?;
    discard_image(&state, post.image.as_deref()).await;
    Ok(Redirect::to(&profile_url(&user.username)))
}

async fn render_form(
    state: &AppState,
    user: &user::Model,
    form: &PostFormView<'_>,
) -> PageResult<Html<String>> {
    let groups = state.group_service.list().await?;
    Ok(Html(views::post_form_page(
        page_ctx(state, Some(user)),
        form,
        &groups,
    )))
}

/// Show the form again with what was submitted and why it was rejected.
async fn rerender(
    state: &AppState,
    user: &user::Model,
    form: &PostForm,
    mut errors: FormErrors,
    post_id: Option<&str>,
) -> PageResult<Response> {
    if form.text.trim().is_empty() && errors.get("text").is_empty() {
        errors.add("text", "This field is required.");
    }

    let group_id = form.group_id();
    let view = PostFormView {
        text: &form.text,
        group_id: group_id.as_deref(),
        errors: &errors,
        post_id,
    };
    Ok(render_form(state, user, &view).await?.into_response())
}

async fn store_image(
    state: &AppState,
    user: &user::Model,
    form: &PostForm,
) -> Result<Option<String>, PageError> {
    let Some(upload) = &form.image else {
        return Ok(None);
    };

    let key = generate_storage_key(&user.id, &upload.file_name);
    let stored = state
        .storage
        .upload(&key, &upload.data, &upload.content_type)
        .await?;
    tracing::debug!(key = %stored.key, size = stored.size, "Stored post image");
    Ok(Some(stored.key))
}

async fn discard_image(state: &AppState, key: Option<&str>) {
    if let Some(key) = key
        && let Err(e) = state.storage.delete(key).await
    {
        tracing::warn!(%key, error = %e, "Failed to delete post image");
    }
}
