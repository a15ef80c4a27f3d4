//! Aesop: a personalized illustrated-storybook pipeline.
//!
//! Aesop turns a story outline plus a reusable character sheet into a set of
//! persisted illustrations and a paginated PDF storybook. This facade crate
//! re-exports the workspace's public surface and provides the
//! [`StorybookPipeline`] convenience type that wires the illustration
//! orchestrator and the document assembler together.
//!
//! # Crates
//!
//! - `aesop_core`: domain model, status state machine, configuration
//! - `aesop_interface`: capability traits (generator, stores, fetcher)
//! - `aesop_prompt`: prompt building and safety sanitization
//! - `aesop_models`: image-API client and bounded image fetcher
//! - `aesop_storage`: keyed filesystem object storage
//! - `aesop_database`: diesel/Postgres persistence
//! - `aesop_illustrator`: the illustration orchestrator
//! - `aesop_document`: PDF assembly

#![forbid(unsafe_code)]

mod cli;
mod pipeline;

pub use cli::{Cli, Commands};
pub use pipeline::StorybookPipeline;

pub use aesop_core::{
    AesopConfig, AttemptStatus, CharacterSheet, DatabaseConfig, DocumentConfig, GeneratedImage,
    GenerationAttempt, GenerationKind, IllustratorConfig, ImageApiConfig, ImageQuality,
    ImageRequest, ImageSize, ImageSource, PageKind, StorageConfig, Story, StoryPage, StoryStatus,
};
pub use aesop_database::{PgPool, PgStoryStore, establish_pool};
pub use aesop_document::{DocumentAssembler, IMAGE_PLACEHOLDER};
pub use aesop_error::{AesopError, AesopErrorKind, AesopResult};
pub use aesop_illustrator::{IllustrationReport, Illustrator, RunBudget};
pub use aesop_interface::{
    FailureKind, ImageFetcher, ImageGenerator, MediaStore, StoredObject, StoryStore,
};
pub use aesop_models::{HttpImageFetcher, OpenAiImageClient};
pub use aesop_prompt::{SafetyTier, illustration_prompt, sanitize_scene};
pub use aesop_storage::FileSystemStore;
