//! Test utilities for database operations.
//!
//! Provides a throwaway in-memory SQLite database with the real schema.

use std::sync::Arc;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::debug;

use crate::migrations::Migrator;

/// A migrated in-memory database, dropped with the last connection handle.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Create a fresh database and run every migration on it.
    pub async fn new() -> Result<Self, DbErr> {
        // Each SQLite in-memory connection is its own database, so the pool
        // must hold exactly one connection for the whole test.
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        debug!("Created in-memory test database");

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Get a shared handle to the connection.
    #[must_use]
    pub fn conn(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{comment, follow, group, post, user};
    use crate::repositories::{
        CommentRepository, FollowRepository, GroupRepository, PostRepository, PostScope,
        UserRepository,
    };
    use chrono::Utc;
    use sea_orm::Set;
    use yatube_common::AppError;

    async fn insert_user(repo: &UserRepository, id: &str) -> user::Model {
        repo.create(user::ActiveModel {
            id: Set(id.to_string()),
            username: Set(id.to_string()),
            name: Set(None),
            password: Set("hash".to_string()),
            token: Set(None),
            is_staff: Set(false),
            created_at: Set(Utc::now().into()),
        })
        .await
        .unwrap()
    }

    async fn insert_post(repo: &PostRepository, id: &str, author: &str, group: Option<&str>) {
        repo.create(post::ActiveModel {
            id: Set(id.to_string()),
            text: Set(format!("text {id}")),
            created_at: Set(Utc::now().into()),
            image: Set(None),
            author_id: Set(author.to_string()),
            group_id: Set(group.map(str::to_string)),
        })
        .await
        .unwrap();
    }

    fn follow_model(id: &str, user_id: &str, author_id: &str) -> follow::ActiveModel {
        follow::ActiveModel {
            id: Set(id.to_string()),
            user_id: Set(user_id.to_string()),
            author_id: Set(author_id.to_string()),
            created_at: Set(Utc::now().into()),
        }
    }

    #[tokio::test]
    async fn test_deleting_group_keeps_posts() {
        let db = TestDatabase::new().await.unwrap();
        let users = UserRepository::new(db.conn());
        let groups = GroupRepository::new(db.conn());
        let posts = PostRepository::new(db.conn());

        insert_user(&users, "u1").await;
        groups
            .create(group::ActiveModel {
                id: Set("g1".to_string()),
                title: Set("Cats".to_string()),
                slug: Set("cats".to_string()),
                description: Set(String::new()),
            })
            .await
            .unwrap();
        insert_post(&posts, "p1", "u1", Some("g1")).await;

        groups.delete("g1").await.unwrap();

        let post = posts.get_by_id("p1").await.unwrap();
        assert_eq!(post.group_id, None);
    }

    #[tokio::test]
    async fn test_deleting_user_removes_posts_and_comments() {
        let db = TestDatabase::new().await.unwrap();
        let users = UserRepository::new(db.conn());
        let posts = PostRepository::new(db.conn());
        let comments = CommentRepository::new(db.conn());

        insert_user(&users, "u1").await;
        insert_user(&users, "u2").await;
        insert_post(&posts, "p1", "u1", None).await;
        insert_post(&posts, "p2", "u2", None).await;
        comments
            .create(comment::ActiveModel {
                id: Set("c1".to_string()),
                post_id: Set("p2".to_string()),
                author_id: Set("u1".to_string()),
                text: Set("hi".to_string()),
                created_at: Set(Utc::now().into()),
            })
            .await
            .unwrap();

        users.delete("u1").await.unwrap();

        assert!(posts.find_by_id("p1").await.unwrap().is_none());
        assert!(comments.find_by_id("c1").await.unwrap().is_none());
        assert_eq!(posts.count(PostScope::All).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_follow_is_conflict() {
        let db = TestDatabase::new().await.unwrap();
        let users = UserRepository::new(db.conn());
        let follows = FollowRepository::new(db.conn());

        insert_user(&users, "u1").await;
        insert_user(&users, "u2").await;

        follows.create(follow_model("f1", "u1", "u2")).await.unwrap();
        let again = follows.create(follow_model("f2", "u1", "u2")).await;

        assert!(matches!(again, Err(AppError::Conflict(_))));
        assert_eq!(follows.count_following("u1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_feed_scope_only_followed_authors() {
        let db = TestDatabase::new().await.unwrap();
        let users = UserRepository::new(db.conn());
        let posts = PostRepository::new(db.conn());
        let follows = FollowRepository::new(db.conn());

        for id in ["reader", "liked", "other"] {
            insert_user(&users, id).await;
        }
        insert_post(&posts, "p1", "liked", None).await;
        insert_post(&posts, "p2", "other", None).await;
        insert_post(&posts, "p3", "liked", None).await;
        follows
            .create(follow_model("f1", "reader", "liked"))
            .await
            .unwrap();

        let feed = posts
            .find_page(PostScope::Feed("reader"), 0, 10)
            .await
            .unwrap();

        let ids: Vec<_> = feed.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p3", "p1"]);
        assert_eq!(posts.count(PostScope::Feed("reader")).await.unwrap(), 2);
    }
}
