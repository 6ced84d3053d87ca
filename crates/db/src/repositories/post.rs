//! Post repository.

use std::sync::Arc;

use crate::entities::{Follow, Post, follow, post};
use crate::repositories::map_write_err;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, sea_query::Query,
};
use yatube_common::{AppError, AppResult};

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope<'a> {
    /// Every post (main page).
    All,
    /// Posts written by a user.
    Author(&'a str),
    /// Posts in a group.
    Group(&'a str),
    /// Posts by every author the given user follows.
    Feed(&'a str),
}

impl PostScope<'_> {
    fn select(self) -> Select<Post> {
        let query = Post::find();
        match self {
            Self::All => query,
            Self::Author(author_id) => query.filter(post::Column::AuthorId.eq(author_id)),
            Self::Group(group_id) => query.filter(post::Column::GroupId.eq(group_id)),
            Self::Feed(user_id) => query.filter(
                post::Column::AuthorId.in_subquery(
                    Query::select()
                        .column(follow::Column::AuthorId)
                        .from(Follow)
                        .and_where(follow::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            ),
        }
    }
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model.update(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Delete a post. Its comments go with it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let post = self.get_by_id(id).await?;
        post.delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count the posts in a scope.
    pub async fn count(&self, scope: PostScope<'_>) -> AppResult<u64> {
        scope
            .select()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get one slice of a scope, newest first.
    pub async fn find_page(
        &self,
        scope: PostScope<'_>,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<post::Model>> {
        scope
            .select()
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Search posts by text and/or group, newest first.
    pub async fn search(
        &self,
        query: Option<&str>,
        group_id: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        let mut condition = Condition::all();

        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            condition = condition.add(post::Column::Text.contains(q));
        }

        if let Some(gid) = group_id {
            condition = condition.add(post::Column::GroupId.eq(gid));
        }

        Post::find()
            .filter(condition)
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
