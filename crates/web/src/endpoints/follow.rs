//! Feed and follow endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::get,
};
use yatube_common::AppResult;
use yatube_db::repositories::PostScope;

use super::cards;
use crate::{extractors::AuthUser, forms::PageQuery, middleware::AppState, views::FollowPage};

const FEED_URL: &str = "/follow/";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/follow/", get(feed))
        .route(
            "/profile/{username}/follow/",
            get(follow_author).post(follow_author),
        )
        .route(
            "/profile/{username}/unfollow/",
            get(unfollow_author).post(unfollow_author),
        )
}

async fn feed(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let page = state
        .post_service
        .list(PostScope::Feed(&user.id), query.page.as_deref())
        .await?;

    Ok(Html(
        FollowPage {
            viewer: Some(user.username),
            posts: cards(&state, page),
        }
        .render(),
    ))
}

async fn follow_author(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
) -> AppResult<Redirect> {
    state.follow_service.follow(&user, &username).await?;
    Ok(Redirect::to(FEED_URL))
}

async fn unfollow_author(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
) -> AppResult<Redirect> {
    state.follow_service.unfollow(&user, &username).await?;
    Ok(Redirect::to(FEED_URL))
}
