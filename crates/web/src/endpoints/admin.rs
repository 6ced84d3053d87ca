//! Staff JSON API.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use serde::{Deserialize, Serialize};
use yatube_core::{CommentView, CreateGroupInput, PostView};
use yatube_db::entities::{follow, group, user};

use crate::{
    extractors::StaffUser,
    middleware::AppState,
    response::{ApiResponse, ApiResult, ok},
};

const DEFAULT_LIMIT: u64 = 50;
const MAX_LIMIT: u64 = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/{id}", delete(delete_group))
        .route("/posts", get(list_posts))
        .route("/posts/{id}", patch(update_post).delete(delete_post))
        .route("/comments", get(list_comments))
        .route("/comments/{id}", delete(delete_comment))
        .route("/users", get(list_users))
        .route("/users/{id}", delete(delete_user))
        .route("/follows", get(list_follows))
        .route("/follows/{id}", delete(delete_follow))
        .route("/cache/clear", post(clear_cache))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<u64>,
    offset: Option<u64>,
}

impl ListQuery {
    fn bounds(&self) -> (u64, u64) {
        (
            self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            self.offset.unwrap_or(0),
        )
    }
}

#[derive(Debug, Deserialize)]
struct PostSearchQuery {
    q: Option<String>,
    group_id: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

/// Editable post fields.
#[derive(Debug, Deserialize)]
struct UpdatePostRequest {
    /// New group ID; `null` or empty removes the post from its group.
    group_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentListQuery {
    post_id: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

/// Comment row in the admin listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdminCommentResponse {
    id: String,
    post_id: String,
    author: String,
    text: String,
    created_at: String,
}

impl From<CommentView> for AdminCommentResponse {
    fn from(view: CommentView) -> Self {
        Self {
            id: view.comment.id,
            post_id: view.comment.post_id,
            author: view.author.username,
            text: view.comment.text,
            created_at: view.comment.created_at.to_rfc3339(),
        }
    }
}

/// Post row in the admin listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdminPostResponse {
    id: String,
    text: String,
    author: String,
    group: Option<String>,
    image: Option<String>,
    created_at: String,
}

impl From<PostView> for AdminPostResponse {
    fn from(view: PostView) -> Self {
        Self {
            id: view.post.id,
            text: view.post.text,
            author: view.author.username,
            group: view.group.map(|g| g.slug),
            image: view.post.image,
            created_at: view.post.created_at.to_rfc3339(),
        }
    }
}

// ==================== Groups ====================

async fn list_groups(
    _staff: StaffUser,
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<Vec<group::Model>>> {
    Ok(ApiResponse::ok(state.group_service.list().await?))
}

async fn create_group(
    _staff: StaffUser,
    State(state): State<AppState>,
    Json(input): Json<CreateGroupInput>,
) -> ApiResult<ApiResponse<group::Model>> {
    Ok(ApiResponse::ok(state.group_service.create(input).await?))
}

async fn delete_group(
    _staff: StaffUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.group_service.delete(&id).await?;
    Ok(ok())
}

// ==================== Posts & comments ====================

async fn list_posts(
    _staff: StaffUser,
    State(state): State<AppState>,
    Query(query): Query<PostSearchQuery>,
) -> ApiResult<ApiResponse<Vec<AdminPostResponse>>> {
    let (limit, offset) = ListQuery {
        limit: query.limit,
        offset: query.offset,
    }
    .bounds();
    let posts = state
        .post_service
        .search(query.q.as_deref(), query.group_id.as_deref(), limit, offset)
        .await?;

    Ok(ApiResponse::ok(posts.into_iter().map(Into::into).collect()))
}

async fn update_post(
    _staff: StaffUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePostRequest>,
) -> ApiResult<ApiResponse<AdminPostResponse>> {
    let view = state
        .post_service
        .set_group(&id, req.group_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(view.into()))
}

async fn delete_post(
    _staff: StaffUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.post_service.delete(&id).await?;
    Ok(ok())
}

async fn list_comments(
    _staff: StaffUser,
    State(state): State<AppState>,
    Query(query): Query<CommentListQuery>,
) -> ApiResult<ApiResponse<Vec<AdminCommentResponse>>> {
    let (limit, offset) = ListQuery {
        limit: query.limit,
        offset: query.offset,
    }
    .bounds();
    let comments = state
        .comment_service
        .list(query.post_id.as_deref(), limit, offset)
        .await?;

    Ok(ApiResponse::ok(comments.into_iter().map(Into::into).collect()))
}

async fn delete_comment(
    _staff: StaffUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.comment_service.delete(&id).await?;
    Ok(ok())
}

// ==================== Users & follows ====================

async fn list_users(
    _staff: StaffUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<ApiResponse<Vec<user::Model>>> {
    let (limit, offset) = query.bounds();
    Ok(ApiResponse::ok(state.user_service.list(limit, offset).await?))
}

async fn delete_user(
    _staff: StaffUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.user_service.delete(&id).await?;
    Ok(ok())
}

async fn list_follows(
    _staff: StaffUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<ApiResponse<Vec<follow::Model>>> {
    let (limit, offset) = query.bounds();
    Ok(ApiResponse::ok(state.follow_service.list(limit, offset).await?))
}

async fn delete_follow(
    _staff: StaffUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.follow_service.delete(&id).await?;
    Ok(ok())
}

// ==================== Cache ====================

async fn clear_cache(
    _staff: StaffUser,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    state.page_cache.clear().await?;
    Ok(ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_bounds() {
        let query = ListQuery {
            limit: None,
            offset: None,
        };
        assert_eq!(query.bounds(), (DEFAULT_LIMIT, 0));

        let query = ListQuery {
            limit: Some(1000),
            offset: Some(20),
        };
        assert_eq!(query.bounds(), (MAX_LIMIT, 20));

        let query = ListQuery {
            limit: Some(0),
            offset: None,
        };
        assert_eq!(query.bounds(), (1, 0));
    }
}
