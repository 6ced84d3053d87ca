//! Follow service.

use chrono::Utc;
use sea_orm::Set;
use tracing::{debug, info};
use yatube_common::{AppError, AppResult, IdGenerator};
use yatube_db::{
    entities::{follow, user},
    repositories::{FollowRepository, UserRepository},
};

/// Result of a follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowResult {
    /// A new relationship was stored.
    Followed,
    /// The relationship already existed.
    AlreadyFollowing,
    /// The user tried to follow themselves; nothing was stored.
    SelfFollow,
}

/// Follow service for business logic.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub const fn new(follow_repo: FollowRepository, user_repo: UserRepository) -> Self {
        Self {
            follow_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Follow the author with the given username.
    pub async fn follow(&self, user: &user::Model, username: &str) -> AppResult<FollowResult> {
        let author = self.user_repo.get_by_username(username).await?;

        if author.id == user.id {
            debug!(user_id = %user.id, "Ignored self-follow");
            return Ok(FollowResult::SelfFollow);
        }

        if self.follow_repo.is_following(&user.id, &author.id).await? {
            return Ok(FollowResult::AlreadyFollowing);
        }

        let model = follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user.id.clone()),
            author_id: Set(author.id.clone()),
            created_at: Set(Utc::now().into()),
        };

        match self.follow_repo.create(model).await {
            Ok(_) => {
                info!(user_id = %user.id, author_id = %author.id, "Followed author");
                Ok(FollowResult::Followed)
            }
            // A concurrent request stored the same pair first
            Err(AppError::Conflict(_)) => Ok(FollowResult::AlreadyFollowing),
            Err(e) => Err(e),
        }
    }

    /// Unfollow the author with the given username. Returns whether a
    /// relationship was removed; unknown usernames remove nothing.
    pub async fn unfollow(&self, user: &user::Model, username: &str) -> AppResult<bool> {
        let Some(author) = self.user_repo.find_by_username(username).await? else {
            debug!(user_id = %user.id, username = %username, "Ignored unfollow of unknown user");
            return Ok(false);
        };
        let removed = self.follow_repo.delete_by_pair(&user.id, &author.id).await?;

        if removed {
            info!(user_id = %user.id, author_id = %author.id, "Unfollowed author");
        }
        Ok(removed)
    }

    /// Whether `viewer` follows `author`; always `false` for anonymous viewers.
    pub async fn is_following(
        &self,
        viewer: Option<&user::Model>,
        author: &user::Model,
    ) -> AppResult<bool> {
        match viewer {
            Some(viewer) if viewer.id != author.id => {
                self.follow_repo.is_following(&viewer.id, &author.id).await
            }
            _ => Ok(false),
        }
    }

    /// Follower and following counts of a user, in that order.
    pub async fn counts(&self, user: &user::Model) -> AppResult<(u64, u64)> {
        let followers = self.follow_repo.count_followers(&user.id).await?;
        let following = self.follow_repo.count_following(&user.id).await?;
        Ok((followers, following))
    }

    /// List relationships for the admin API.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<follow::Model>> {
        self.follow_repo.list(limit, offset).await
    }

    /// Remove a relationship by ID.
    pub async fn delete(&self, follow_id: &str) -> AppResult<()> {
        self.follow_repo.delete(follow_id).await?;
        info!(follow_id = %follow_id, "Follow deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

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

    fn create_test_follow(user_id: &str, author_id: &str) -> follow::Model {
        follow::Model {
            id: "f1".to_string(),
            user_id: user_id.to_string(),
            author_id: author_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> FollowService {
        let conn = Arc::new(db.into_connection());
        FollowService::new(FollowRepository::new(Arc::clone(&conn)), UserRepository::new(conn))
    }

    #[tokio::test]
    async fn test_self_follow_is_noop() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user("u1")]]);

        let result = service(db)
            .follow(&create_test_user("u1"), "u1")
            .await
            .unwrap();

        assert_eq!(result, FollowResult::SelfFollow);
    }

    #[tokio::test]
    async fn test_repeated_follow_is_noop() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user("u2")]])
            .append_query_results([[create_test_follow("u1", "u2")]]);

        let result = service(db)
            .follow(&create_test_user("u1"), "u2")
            .await
            .unwrap();

        assert_eq!(result, FollowResult::AlreadyFollowing);
    }

    #[tokio::test]
    async fn test_follow_unknown_author() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()]);

        let result = service(db).follow(&create_test_user("u1"), "ghost").await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_unfollow_unknown_author_is_noop() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()]);

        let removed = service(db)
            .unfollow(&create_test_user("u1"), "ghost")
            .await
            .unwrap();

        assert!(!removed);
    }

    #[tokio::test]
    async fn test_is_following_anonymous() {
        let db = MockDatabase::new(DatabaseBackend::Postgres);

        let following = service(db)
            .is_following(None, &create_test_user("u2"))
            .await
            .unwrap();

        assert!(!following);
    }
}
