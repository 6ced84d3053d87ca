//! Post listing, detail and form pages.

use axum::{
    Form, Router,
    extract::{Multipart, Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tracing::warn;
use yatube_common::{AppError, AppResult};
use yatube_core::{EditOutcome, PostInput};
use yatube_db::{entities::user, repositories::PostScope};

use super::{card, cards};
use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    forms::{CommentForm, PageQuery, read_post_form},
    middleware::AppState,
    views::{GroupPage, IndexPage, PostDetailPage, PostFormPage, ProfilePage},
};

/// Prefix of the main page cache keys.
const INDEX_CACHE_PREFIX: &str = "index_page";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route("/posts/{post_id}/", get(post_detail))
        .route("/create/", get(create_form).post(create_post))
        .route("/posts/{post_id}/edit/", get(edit_form).post(edit_post))
        .route("/posts/{post_id}/comment/", post(add_comment))
}

/// Cache key of a main page rendering.
///
/// Pages differ by viewer (navigation links) and by page number only.
#[must_use]
pub fn index_cache_key(viewer: Option<&user::Model>, page: u64) -> String {
    let viewer = viewer.map_or("anon", |u| u.id.as_str());
    format!("{INDEX_CACHE_PREFIX}:{viewer}:{page}")
}

async fn index(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let (number, total) = state
        .post_service
        .locate_page(PostScope::All, query.page.as_deref())
        .await?;

    let key = index_cache_key(viewer.as_ref(), number);
    match state.page_cache.get(&key).await {
        Ok(Some(body)) => return Ok(Html(body)),
        Ok(None) => {}
        Err(e) => warn!(error = %e, key = %key, "Page cache read failed"),
    }

    let page = state.post_service.page(PostScope::All, number, total).await?;
    let body = IndexPage {
        viewer: viewer.map(|u| u.username),
        posts: cards(&state, page),
    }
    .render();

    if let Err(e) = state.page_cache.insert(&key, body.clone()).await {
        warn!(error = %e, key = %key, "Page cache write failed");
    }

    Ok(Html(body))
}

async fn group_posts(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let group = state.group_service.get_by_slug(&slug).await?;
    let page = state
        .post_service
        .list(PostScope::Group(&group.id), query.page.as_deref())
        .await?;

    Ok(Html(
        GroupPage {
            viewer: viewer.map(|u| u.username),
            posts: cards(&state, page),
            group,
        }
        .render(),
    ))
}

async fn profile(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let author = state.user_service.get_by_username(&username).await?;
    let following = state
        .follow_service
        .is_following(viewer.as_ref(), &author)
        .await?;
    let (followers, follows) = state.follow_service.counts(&author).await?;
    let page = state
        .post_service
        .list(PostScope::Author(&author.id), query.page.as_deref())
        .await?;

    Ok(Html(
        ProfilePage {
            viewer: viewer.map(|u| u.username),
            posts: cards(&state, page),
            author,
            following,
            followers,
            follows,
        }
        .render(),
    ))
}

async fn post_detail(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(post_id): Path<String>,
) -> AppResult<Html<String>> {
    let view = state.post_service.get(&post_id).await?;
    let author_posts = state
        .post_service
        .count(PostScope::Author(&view.author.id))
        .await?;
    let comments = state.comment_service.list_for_post(&view.post.id).await?;

    Ok(Html(
        PostDetailPage {
            viewer: viewer.map(|u| u.username),
            post: card(&state, &view),
            author_posts,
            comments,
        }
        .render(),
    ))
}

async fn create_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Html<String>> {
    let page = PostFormPage {
        viewer: Some(user.username),
        groups: state.group_service.list().await?,
        ..Default::default()
    };
    Ok(Html(page.render()))
}

async fn create_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let input = read_post_form(multipart).await?;
    let (text, group) = (input.text.clone(), input.group.clone());

    match state.post_service.create(&user, input).await {
        Ok(_) => {
            let to = format!("/profile/{}/", urlencoding::encode(&user.username));
            Ok(Redirect::to(&to).into_response())
        }
        Err(AppError::InvalidForm(errors)) => {
            let page = PostFormPage {
                viewer: Some(user.username),
                post_id: None,
                text,
                group,
                groups: state.group_service.list().await?,
                errors,
            };
            Ok(Html(page.render()).into_response())
        }
        Err(e) => Err(e),
    }
}

async fn edit_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let view = state.post_service.get(&post_id).await?;
    if view.post.author_id != user.id {
        return Ok(Redirect::to(&detail_url(&view.post.id)).into_response());
    }

    let page = PostFormPage {
        viewer: Some(user.username),
        post_id: Some(view.post.id),
        text: view.post.text,
        group: view.post.group_id,
        groups: state.group_service.list().await?,
        ..Default::default()
    };
    Ok(Html(page.render()).into_response())
}

async fn edit_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
    multipart: Multipart,
) -> AppResult<Response> {
    let input: PostInput = read_post_form(multipart).await?;
    let (text, group) = (input.text.clone(), input.group.clone());

    match state.post_service.edit(&user, &post_id, input).await {
        Ok(EditOutcome::Updated(post) | EditOutcome::NotAuthor(post)) => {
            Ok(Redirect::to(&detail_url(&post.id)).into_response())
        }
        Err(AppError::InvalidForm(errors)) => {
            let page = PostFormPage {
                viewer: Some(user.username),
                post_id: Some(post_id),
                text,
                group,
                groups: state.group_service.list().await?,
                errors,
            };
            Ok(Html(page.render()).into_response())
        }
        Err(e) => Err(e),
    }
}

async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> AppResult<Redirect> {
    state.comment_service.add(&user, &post_id, &form.text).await?;
    Ok(Redirect::to(&detail_url(&post_id)))
}

fn detail_url(post_id: &str) -> String {
    format!("/posts/{}/", urlencoding::encode(post_id))
}
