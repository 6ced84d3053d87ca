//! Group service.

use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::info;
use validator::Validate;
use yatube_common::{AppError, AppResult, FieldErrors, IdGenerator};
use yatube_db::{entities::group, repositories::GroupRepository};

/// Letters, digits, hyphens and underscores.
#[allow(clippy::unwrap_used)]
static SLUG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap());

/// Input for creating a group.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupInput {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters."))]
    pub title: String,

    #[validate(regex(
        path = *SLUG_REGEX,
        message = "Enter a valid slug consisting of letters, numbers, underscores or hyphens."
    ))]
    pub slug: String,

    #[serde(default)]
    pub description: String,
}

/// Group service for business logic.
#[derive(Clone)]
pub struct GroupService {
    group_repo: GroupRepository,
    id_gen: IdGenerator,
}

impl GroupService {
    /// Create a new group service.
    #[must_use]
    pub const fn new(group_repo: GroupRepository) -> Self {
        Self {
            group_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a group by slug.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<group::Model> {
        self.group_repo.get_by_slug(slug).await
    }

    /// All groups, ordered by title.
    pub async fn list(&self) -> AppResult<Vec<group::Model>> {
        self.group_repo.find_all().await
    }

    /// Create a group.
    pub async fn create(&self, input: CreateGroupInput) -> AppResult<group::Model> {
        input.validate()?;

        if self.group_repo.find_by_slug(&input.slug).await?.is_some() {
            return Err(slug_taken());
        }

        let model = group::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title.trim().to_string()),
            slug: Set(input.slug),
            description: Set(input.description),
        };

        let group = self.group_repo.create(model).await.map_err(|e| match e {
            AppError::Conflict(_) => slug_taken(),
            other => other,
        })?;

        info!(group_id = %group.id, slug = %group.slug, "Group created");
        Ok(group)
    }

    /// Delete a group. Posts in it remain, without a group.
    pub async fn delete(&self, group_id: &str) -> AppResult<()> {
        self.group_repo.delete(group_id).await?;
        info!(group_id = %group_id, "Group deleted");
        Ok(())
    }
}

fn slug_taken() -> AppError {
    AppError::InvalidForm(FieldErrors::single(
        "slug",
        "Group with this slug already exists.",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn input(title: &str, slug: &str) -> CreateGroupInput {
        CreateGroupInput {
            title: title.to_string(),
            slug: slug.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_slug_validation() {
        assert!(input("Cats", "cats_and-dogs-2").validate().is_ok());
        assert!(input("Cats", "cats and dogs").validate().is_err());
        assert!(input("Cats", "").validate().is_err());
        assert!(input(&"x".repeat(201), "cats").validate().is_err());
    }

    #[tokio::test]
    async fn test_create_rejects_taken_slug() {
        let existing = group::Model {
            id: "g1".to_string(),
            title: "Cats".to_string(),
            slug: "cats".to_string(),
            description: String::new(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );

        let service = GroupService::new(GroupRepository::new(db));
        let result = service.create(input("More cats", "cats")).await;

        match result {
            Err(AppError::InvalidForm(errors)) => assert!(!errors.get("slug").is_empty()),
            other => panic!("expected form error, got {other:?}"),
        }
    }
}
