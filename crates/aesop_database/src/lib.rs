//! PostgreSQL integration for Aesop.
//!
//! This crate provides the diesel schema, row models, and repository
//! implementations for persisting stories, pages, character sheets, and
//! generation attempts.
//!
//! Two access layers are exposed:
//! - [`StoryRepository`] / [`PostgresStoryRepository`]: synchronous diesel
//!   operations over a borrowed connection.
//! - [`PgStoryStore`]: the async [`StoryStore`](aesop_interface::StoryStore)
//!   adapter the orchestrator consumes, backed by an r2d2 pool and
//!   `spawn_blocking`.
//!
//! # Example
//!
//! ```rust,ignore
//! use aesop_database::{PgStoryStore, establish_pool};
//!
//! let pool = establish_pool("postgres://localhost/aesop")?;
//! let store = PgStoryStore::new(pool);
//! ```

#![forbid(unsafe_code)]

mod connection;
mod models;
mod repository;
mod store;

pub mod schema;

pub use connection::{PgPool, establish_pool};
pub use models::{
    CharacterSheetRow, GenerationAttemptRow, NewGenerationAttemptRow, NewStoryPageRow,
    NewStoryRow, StoryPageRow, StoryRow,
};
pub use repository::{PostgresStoryRepository, StoryRepository};
pub use store::PgStoryStore;

use aesop_error::DatabaseError;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
