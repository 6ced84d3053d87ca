//! SeaORM entities.

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

use sea_orm::prelude::DateTimeWithTimeZone;

pub use comment::Entity as Comment;
pub use follow::Entity as Follow;
pub use group::Entity as Group;
pub use post::Entity as Post;
pub use user::Entity as User;

/// Rows that record when they were created.
///
/// Posts and comments share this column and are listed newest first by it.
pub trait Created {
    /// Creation timestamp.
    fn created(&self) -> DateTimeWithTimeZone;
}

impl Created for post::Model {
    fn created(&self) -> DateTimeWithTimeZone {
        self.created_at
    }
}

impl Created for comment::Model {
    fn created(&self) -> DateTimeWithTimeZone {
        self.created_at
    }
}
