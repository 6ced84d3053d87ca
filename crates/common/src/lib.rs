//! Common utilities and shared types for yatube.
//!
//! This crate provides foundational components used across all yatube crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Forms**: Per-field validation errors via [`FieldErrors`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Page cache**: Rendered-output caching with a TTL via [`PageCache`]
//! - **Storage**: File storage for uploaded post images
//!
//! # Example
//!
//! ```no_run
//! use yatube_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("{} listening on port {}: {}", id, config.server.port, config.server.url);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod form;
pub mod id;
pub mod storage;

pub use cache::{MemoryPageCache, PageCache, RedisPageCache, SharedPageCache};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use form::FieldErrors;
pub use id::IdGenerator;
pub use storage::{LocalStorage, SharedStorage, StorageBackend, UploadedFile};
