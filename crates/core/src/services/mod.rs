//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use comment::{CommentService, CommentView};
pub use follow::{FollowResult, FollowService};
pub use group::{CreateGroupInput, GroupService};
pub use post::{EditOutcome, ImageUpload, PostInput, PostService, PostView};
pub use user::{SignupInput, UserService};
