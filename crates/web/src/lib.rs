//! HTTP layer for yatube.
//!
//! This crate provides the server-rendered site and the staff API:
//!
//! - **Endpoints**: listings, post pages, forms, follows, accounts, admin
//! - **Extractors**: current user, login redirect, staff check
//! - **Middleware**: session authentication
//! - **Views**: typed page models rendered to HTML
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod forms;
pub mod middleware;
pub mod render;
pub mod response;
pub mod views;

pub use endpoints::router;
pub use middleware::{AppState, SESSION_COOKIE, auth_middleware};
