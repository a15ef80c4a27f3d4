//! Error types for the Aesop storybook pipeline.
//!
//! This crate provides the foundation error types used throughout the Aesop
//! workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error
//! handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use aesop_error::{AesopResult, ConfigError};
//!
//! fn load_settings() -> AesopResult<String> {
//!     Err(ConfigError::new("Missing field"))?
//! }
//!
//! match load_settings() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
#[cfg(feature = "database")]
mod database;
mod document;
mod error;
mod image_gen;
mod pipeline;
mod storage;

pub use config::ConfigError;
#[cfg(feature = "database")]
pub use database::{DatabaseError, DatabaseErrorKind};
pub use document::{DocumentError, DocumentErrorKind};
pub use error::{AesopError, AesopErrorKind, AesopResult};
pub use image_gen::{ImageGenError, ImageGenErrorKind, RetryableError};
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use storage::{StorageError, StorageErrorKind};
