//! Page and API endpoints.

mod admin;
mod auth;
mod follow;
mod posts;

use axum::{
    Router,
    http::{StatusCode, Uri},
    response::Html,
};
use yatube_core::{Page, PostView};

use crate::extractors::MaybeAuthUser;
use crate::middleware::AppState;
use crate::views::{NotFoundPage, PostCard};

pub use posts::index_cache_key;

/// Create the site router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(posts::router())
        .merge(follow::router())
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .fallback(not_found)
}

async fn not_found(MaybeAuthUser(viewer): MaybeAuthUser, uri: Uri) -> (StatusCode, Html<String>) {
    let page = NotFoundPage {
        viewer: viewer.map(|u| u.username),
        path: uri.path().to_string(),
    };
    (StatusCode::NOT_FOUND, Html(page.render()))
}

/// Turn a page of posts into cards with resolved image URLs.
fn cards(state: &AppState, page: Page<PostView>) -> Page<PostCard> {
    page.map(|view| card(state, &view))
}

fn card(state: &AppState, view: &PostView) -> PostCard {
    let image_url = view
        .post
        .image
        .as_deref()
        .map(|key| state.post_service.image_url(key));
    PostCard::new(view, image_url)
}
