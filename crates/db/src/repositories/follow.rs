//! Follow repository.

use std::sync::Arc;

use crate::entities::{Follow, follow};
use crate::repositories::map_write_err;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use yatube_common::{AppError, AppResult};

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a follow relationship by follower and author.
    pub async fn find_by_pair(
        &self,
        user_id: &str,
        author_id: &str,
    ) -> AppResult<Option<follow::Model>> {
        Follow::find()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user follows an author.
    pub async fn is_following(&self, user_id: &str, author_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(user_id, author_id).await?.is_some())
    }

    /// Create a new follow relationship.
    ///
    /// Returns [`AppError::Conflict`] if the pair already exists.
    pub async fn create(&self, model: follow::ActiveModel) -> AppResult<follow::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Delete a follow relationship by pair. Missing pairs are ignored.
    pub async fn delete_by_pair(&self, user_id: &str, author_id: &str) -> AppResult<bool> {
        let Some(existing) = self.find_by_pair(user_id, author_id).await? else {
            return Ok(false);
        };

        existing
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    /// Delete a follow relationship by ID.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let existing = Follow::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Follow not found: {id}")))?;

        existing
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List follow relationships, newest first.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<follow::Model>> {
        Follow::find()
            .order_by_desc(follow::Column::CreatedAt)
            .order_by_desc(follow::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the authors a user follows.
    pub async fn count_following(&self, user_id: &str) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the followers of an author.
    pub async fn count_followers(&self, author_id: &str) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_follow(id: &str, user_id: &str, author_id: &str) -> follow::Model {
        follow::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            author_id: author_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_is_following_true() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_follow("f1", "user1", "user2")]])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert!(repo.is_following("user1", "user2").await.unwrap());
    }

    #[tokio::test]
    async fn test_is_following_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<follow::Model>::new()])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert!(!repo.is_following("user1", "user3").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_pair_existing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_follow("f1", "user1", "user2")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert!(repo.delete_by_pair("user1", "user2").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_pair_missing_is_noop() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<follow::Model>::new()])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert!(!repo.delete_by_pair("user1", "user2").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_follow() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<follow::Model>::new()])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert!(matches!(repo.delete("missing").await, Err(AppError::NotFound(_))));
    }
}
