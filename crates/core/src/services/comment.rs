//! Comment service.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::Set;
use tracing::{debug, info};
use yatube_common::{AppResult, IdGenerator};
use yatube_db::{
    entities::{comment, user},
    repositories::{CommentRepository, PostRepository, UserRepository},
};

/// A comment with its author.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub comment: comment::Model,
    pub author: user::Model,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a comment to a post.
    ///
    /// Blank text is dropped and `None` is returned. Unknown posts are an error.
    pub async fn add(
        &self,
        author: &user::Model,
        post_id: &str,
        text: &str,
    ) -> AppResult<Option<comment::Model>> {
        let post = self.post_repo.get_by_id(post_id).await?;

        let text = text.trim();
        if text.is_empty() {
            debug!(post_id = %post.id, "Dropped blank comment");
            return Ok(None);
        }

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id),
            author_id: Set(author.id.clone()),
            text: Set(text.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let comment = self.comment_repo.create(model).await?;
        info!(comment_id = %comment.id, post_id = %comment.post_id, "Comment added");
        Ok(Some(comment))
    }

    /// Comments on a post with their authors, newest first.
    pub async fn list_for_post(&self, post_id: &str) -> AppResult<Vec<CommentView>> {
        let comments = self.comment_repo.find_by_post(post_id).await?;
        self.with_authors(comments).await
    }

    /// List comments for the admin API, newest first.
    pub async fn list(
        &self,
        post_id: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<CommentView>> {
        let comments = self.comment_repo.list(post_id, limit, offset).await?;
        self.with_authors(comments).await
    }

    async fn with_authors(&self, comments: Vec<comment::Model>) -> AppResult<Vec<CommentView>> {
        let mut author_ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(comments
            .into_iter()
            .filter_map(|comment| {
                let author = authors.get(&comment.author_id).cloned()?;
                Some(CommentView { comment, author })
            })
            .collect())
    }

    /// Delete a comment.
    pub async fn delete(&self, comment_id: &str) -> AppResult<()> {
        self.comment_repo.delete(comment_id).await?;
        info!(comment_id = %comment_id, "Comment deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use yatube_common::AppError;
    use yatube_db::entities::post;

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: id.to_string(),
            name: None,
            password: "hash".to_string(),
            token: None,
            is_staff: false,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_post(id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            text: "Post".to_string(),
            created_at: Utc::now().into(),
            image: None,
            author_id: "u1".to_string(),
            group_id: None,
        }
    }

    fn service(db: MockDatabase) -> CommentService {
        let conn = Arc::new(db.into_connection());
        CommentService::new(
            CommentRepository::new(Arc::clone(&conn)),
            PostRepository::new(Arc::clone(&conn)),
            UserRepository::new(conn),
        )
    }

    #[tokio::test]
    async fn test_add_comment() {
        let stored = comment::Model {
            id: "c1".to_string(),
            post_id: "p1".to_string(),
            author_id: "u2".to_string(),
            text: "Great".to_string(),
            created_at: Utc::now().into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_post("p1")]])
            .append_query_results([[stored]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);

        let comment = service(db)
            .add(&create_test_user("u2"), "p1", "  Great ")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(comment.text, "Great");
        assert_eq!(comment.post_id, "p1");
    }

    #[tokio::test]
    async fn test_blank_comment_is_dropped() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_post("p1")]]);

        let result = service(db)
            .add(&create_test_user("u2"), "p1", "   ")
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_comment_on_missing_post() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()]);

        let result = service(db).add(&create_test_user("u2"), "nope", "Hi").await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }
}
