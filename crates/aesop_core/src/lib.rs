//! Core data types for the Aesop storybook pipeline.
//!
//! This crate defines the domain model shared by every other Aesop crate:
//! stories, story pages, character sheets, generation attempts, the story
//! status state machine, image-API request/response types, and the layered
//! TOML configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod attempt;
mod character;
mod config;
mod image_api;
mod page;
mod status;
mod story;

pub use attempt::{AttemptStatus, GenerationAttempt, GenerationKind};
pub use character::CharacterSheet;
pub use config::{
    AesopConfig, DatabaseConfig, DocumentConfig, IllustratorConfig, ImageApiConfig, StorageConfig,
};
pub use image_api::{GeneratedImage, ImageQuality, ImageRequest, ImageSize};
pub use page::{ImageSource, PageKind, StoryPage};
pub use status::StoryStatus;
pub use story::Story;
