//! Core business logic for yatube.

pub mod pagination;
pub mod services;

pub use pagination::{PAGE_SIZE, Page};
pub use services::*;
