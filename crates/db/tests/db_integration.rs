//! Database integration tests.
//!
//! Run the real migrations against an in-memory SQLite database and check
//! the constraints and queries the repositories rely on.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use yatube_common::AppError;
use yatube_db::{
    entities::{comment, follow, group, post, user},
    migrations::Migrator,
    repositories::{
        CommentRepository, FollowRepository, GroupRepository, PostRepository, PostScope,
        UserRepository,
    },
};

async fn connect() -> Arc<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    Arc::new(db)
}

fn ago(secs: i64) -> DateTime<FixedOffset> {
    (Utc::now() - TimeDelta::seconds(secs)).into()
}

fn new_user(id: &str) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(id.to_string()),
        username: Set(id.to_string()),
        name: Set(None),
        password: Set("hash".to_string()),
        token: Set(Some(format!("token-{id}"))),
        is_staff: Set(false),
        created_at: Set(Utc::now().into()),
    }
}

fn new_group(id: &str, slug: &str) -> group::ActiveModel {
    group::ActiveModel {
        id: Set(id.to_string()),
        title: Set(format!("Group {slug}")),
        slug: Set(slug.to_string()),
        description: Set(String::new()),
    }
}

fn new_post(
    id: &str,
    author: &str,
    group: Option<&str>,
    text: &str,
    created_at: DateTime<FixedOffset>,
) -> post::ActiveModel {
    post::ActiveModel {
        id: Set(id.to_string()),
        text: Set(text.to_string()),
        created_at: Set(created_at),
        image: Set(None),
        author_id: Set(author.to_string()),
        group_id: Set(group.map(str::to_string)),
    }
}

#[tokio::test]
async fn test_migrations_roll_back_and_reapply() {
    let db = connect().await;

    Migrator::down(db.as_ref(), None).await.unwrap();
    Migrator::up(db.as_ref(), None).await.unwrap();

    let users = UserRepository::new(Arc::clone(&db));
    users.create(new_user("u1")).await.unwrap();
    assert_eq!(users.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_unique_constraints_are_conflicts() {
    let db = connect().await;
    let users = UserRepository::new(Arc::clone(&db));
    let groups = GroupRepository::new(Arc::clone(&db));

    users.create(new_user("leo")).await.unwrap();
    let mut duplicate = new_user("leo-2");
    duplicate.username = Set("leo".to_string());
    assert!(matches!(
        users.create(duplicate).await,
        Err(AppError::Conflict(_))
    ));

    groups.create(new_group("g1", "cats")).await.unwrap();
    assert!(matches!(
        groups.create(new_group("g2", "cats")).await,
        Err(AppError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_self_follow_is_rejected_by_schema() {
    let db = connect().await;
    let users = UserRepository::new(Arc::clone(&db));
    let follows = FollowRepository::new(Arc::clone(&db));
    users.create(new_user("leo")).await.unwrap();

    let result = follows
        .create(follow::ActiveModel {
            id: Set("f1".to_string()),
            user_id: Set("leo".to_string()),
            author_id: Set("leo".to_string()),
            created_at: Set(Utc::now().into()),
        })
        .await;

    assert!(result.is_err());
    assert_eq!(follows.count_following("leo").await.unwrap(), 0);
}

#[tokio::test]
async fn test_pages_are_newest_first_with_id_tie_break() {
    let db = connect().await;
    let users = UserRepository::new(Arc::clone(&db));
    let posts = PostRepository::new(Arc::clone(&db));
    users.create(new_user("leo")).await.unwrap();

    let same_time = ago(60);
    posts.create(new_post("a", "leo", None, "a", same_time)).await.unwrap();
    posts.create(new_post("b", "leo", None, "b", same_time)).await.unwrap();
    posts.create(new_post("c", "leo", None, "c", ago(5))).await.unwrap();
    posts.create(new_post("d", "leo", None, "d", ago(120))).await.unwrap();

    let first = posts.find_page(PostScope::All, 0, 3).await.unwrap();
    let ids: Vec<_> = first.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["c", "b", "a"]);

    let rest = posts.find_page(PostScope::All, 3, 3).await.unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].id, "d");
}

#[tokio::test]
async fn test_scopes_and_search() {
    let db = connect().await;
    let users = UserRepository::new(Arc::clone(&db));
    let groups = GroupRepository::new(Arc::clone(&db));
    let posts = PostRepository::new(Arc::clone(&db));

    users.create(new_user("leo")).await.unwrap();
    users.create(new_user("ann")).await.unwrap();
    groups.create(new_group("g1", "cats")).await.unwrap();

    posts
        .create(new_post("p1", "leo", Some("g1"), "A cat on a mat", ago(3)))
        .await
        .unwrap();
    posts
        .create(new_post("p2", "ann", Some("g1"), "Another cat", ago(2)))
        .await
        .unwrap();
    posts
        .create(new_post("p3", "ann", None, "A dog", ago(1)))
        .await
        .unwrap();

    assert_eq!(posts.count(PostScope::All).await.unwrap(), 3);
    assert_eq!(posts.count(PostScope::Group("g1")).await.unwrap(), 2);
    assert_eq!(posts.count(PostScope::Author("ann")).await.unwrap(), 2);
    assert_eq!(posts.count(PostScope::Feed("leo")).await.unwrap(), 0);

    let cats = posts.search(Some("cat"), None, 10, 0).await.unwrap();
    assert_eq!(cats.len(), 2);

    let ann_in_group = posts.search(Some("Another"), Some("g1"), 10, 0).await.unwrap();
    assert_eq!(ann_in_group.len(), 1);
    assert_eq!(ann_in_group[0].id, "p2");

    let everything = posts.search(Some("  "), None, 10, 0).await.unwrap();
    assert_eq!(everything.len(), 3);
}

#[tokio::test]
async fn test_deleting_post_removes_comments() {
    let db = connect().await;
    let users = UserRepository::new(Arc::clone(&db));
    let posts = PostRepository::new(Arc::clone(&db));
    let comments = CommentRepository::new(Arc::clone(&db));

    users.create(new_user("leo")).await.unwrap();
    posts
        .create(new_post("p1", "leo", None, "text", ago(0)))
        .await
        .unwrap();
    for (id, age) in [("c1", 10), ("c2", 5)] {
        comments
            .create(comment::ActiveModel {
                id: Set(id.to_string()),
                post_id: Set("p1".to_string()),
                author_id: Set("leo".to_string()),
                text: Set(format!("comment {id}")),
                created_at: Set(ago(age)),
            })
            .await
            .unwrap();
    }

    let listed = comments.find_by_post("p1").await.unwrap();
    let ids: Vec<_> = listed.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["c2", "c1"]);

    posts.delete("p1").await.unwrap();

    assert!(comments.find_by_post("p1").await.unwrap().is_empty());
    assert!(comments.find_by_id("c1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_token_lookup() {
    let db = connect().await;
    let users = UserRepository::new(Arc::clone(&db));
    users.create(new_user("leo")).await.unwrap();

    let found = users.find_by_token("token-leo").await.unwrap();
    assert_eq!(found.map(|u| u.username), Some("leo".to_string()));
    assert!(users.find_by_token("stale").await.unwrap().is_none());
}
