//! Repositories: one per entity, each wrapping a shared connection.

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use comment::CommentRepository;
pub use follow::FollowRepository;
pub use group::GroupRepository;
pub use post::{PostRepository, PostScope};
pub use user::UserRepository;

use sea_orm::{DbErr, SqlErr};
use yatube_common::AppError;

/// Map a write error, turning unique-constraint violations into conflicts.
pub(crate) fn map_write_err(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => AppError::Conflict(detail),
        _ => AppError::Database(e.to_string()),
    }
}
