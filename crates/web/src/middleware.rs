//! Application state and session middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::debug;
use yatube_common::SharedPageCache;
use yatube_core::{CommentService, FollowService, GroupService, PostService, UserService};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "yatube_session";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub post_service: PostService,
    pub group_service: GroupService,
    pub comment_service: CommentService,
    pub follow_service: FollowService,
    pub page_cache: SharedPageCache,
}

/// Authentication middleware.
///
/// Resolves the session cookie (or a bearer token) to a user and stores it
/// in the request extensions. Unknown tokens leave the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| bearer_token(&req));

    if let Some(token) = token {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => debug!(error = %e, "Ignoring unknown session token"),
        }
    }

    next.run(req).await
}

fn bearer_token(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}
