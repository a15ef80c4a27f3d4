//! Capability trait definitions for the Aesop storybook pipeline.
//!
//! The orchestrator and assembler are written against these traits, never
//! against vendor SDKs or a concrete database. Production wiring lives in
//! `aesop_models`, `aesop_storage`, and `aesop_database`; tests substitute
//! in-memory fakes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{ImageFetcher, ImageGenerator, MediaStore, StoryStore};
pub use types::{FailureKind, StoredObject};
