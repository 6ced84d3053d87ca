//! User service: accounts and sessions.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::info;
use validator::Validate;
use yatube_common::{AppError, AppResult, Config, FieldErrors, IdGenerator};
use yatube_db::{entities::user, repositories::UserRepository};

/// Letters, digits and `@ . + - _`.
#[allow(clippy::unwrap_used)]
static USERNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
    config: Config,
}

/// Input for signing up.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupInput {
    #[validate(
        length(min = 1, max = 150, message = "Enter a username of at most 150 characters."),
        regex(
            path = *USERNAME_REGEX,
            message = "Enter a valid username. It may contain only letters, numbers, and @/./+/-/_ characters."
        )
    )]
    pub username: String,

    #[validate(length(max = 150))]
    pub name: Option<String>,

    #[validate(length(min = 8, max = 128, message = "This password is too short. It must contain at least 8 characters."))]
    pub password: String,

    #[validate(must_match(other = "password", message = "The two password fields didn't match."))]
    pub password_confirm: String,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(user_repo: UserRepository, config: &Config) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
            config: config.clone(),
        }
    }

    /// Create an account. The new user gets a session token right away.
    pub async fn signup(&self, input: SignupInput) -> AppResult<user::Model> {
        input.validate()?;

        let username = input.username.trim().to_string();
        if self.user_repo.find_by_username(&username).await?.is_some() {
            return Err(AppError::InvalidForm(FieldErrors::single(
                "username",
                "A user with that username already exists.",
            )));
        }

        let password_hash = hash_password(&input.password)?;
        let is_staff = self.config.is_staff_username(&username);

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(username),
            name: Set(input.name.filter(|n| !n.trim().is_empty())),
            password: Set(password_hash),
            token: Set(Some(self.id_gen.generate_token())),
            is_staff: Set(is_staff),
            created_at: Set(Utc::now().into()),
        };

        let user = self.user_repo.create(model).await.map_err(|e| match e {
            AppError::Conflict(_) => AppError::InvalidForm(FieldErrors::single(
                "username",
                "A user with that username already exists.",
            )),
            other => other,
        })?;

        info!(user_id = %user.id, username = %user.username, is_staff, "User signed up");
        Ok(user)
    }

    /// Check a username and password; on success the user is returned with a
    /// live session token.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_username(username.trim())
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password)? {
            return Err(AppError::Unauthorized);
        }

        if user.token.is_some() {
            return Ok(user);
        }

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(self.id_gen.generate_token()));
        self.user_repo.update(active).await
    }

    /// Authenticate a user by session token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// End every session of a user by rotating their token.
    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(self.id_gen.generate_token()));
        self.user_repo.update(active).await?;

        info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_username(username).await
    }

    /// List users, newest first.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<user::Model>> {
        self.user_repo.list(limit, offset).await
    }

    /// Delete a user with everything they wrote.
    pub async fn delete(&self, user_id: &str) -> AppResult<()> {
        self.user_repo.delete(user_id).await?;
        info!(user_id = %user_id, "User deleted");
        Ok(())
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
