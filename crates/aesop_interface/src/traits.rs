//! Capability traits consumed by the pipeline.

use crate::StoredObject;
use aesop_core::{
    AttemptStatus, CharacterSheet, GeneratedImage, GenerationAttempt, GenerationKind,
    ImageRequest, ImageSource, Story, StoryPage, StoryStatus,
};
use aesop_error::AesopResult;
use async_trait::async_trait;
use uuid::Uuid;

/// An image-generation service.
///
/// Implementations must surface HTTP 429 distinctly
/// (`ImageGenErrorKind::RateLimited`) and content-policy rejections
/// distinctly (`ImageGenErrorKind::ContentPolicy`) so the orchestrator can
/// tune backoff and switch to safer prompts.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image for the given request.
    async fn generate(&self, req: &ImageRequest) -> AesopResult<GeneratedImage>;

    /// Provider name (e.g. "openai").
    fn provider_name(&self) -> &'static str;

    /// Model identifier (e.g. "dall-e-3").
    fn model_name(&self) -> &str;
}

/// Durable object storage keyed by hierarchical string keys.
///
/// Keys never collide across concurrent pipeline writes because they are
/// scoped by story id, page number, and attempt.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store bytes under `key`, returning a reference with URL and hash.
    async fn put(&self, key: &str, data: &[u8], mime: &str) -> AesopResult<StoredObject>;

    /// Retrieve the bytes stored under `key`.
    async fn get(&self, key: &str) -> AesopResult<Vec<u8>>;

    /// Check whether `key` exists.
    async fn exists(&self, key: &str) -> AesopResult<bool>;

    /// Delete the object stored under `key`.
    async fn delete(&self, key: &str) -> AesopResult<()>;
}

/// Row-level access to stories, pages, character sheets, and generation
/// attempts.
///
/// Every write is a narrowly scoped single-row update; page rows are
/// disjoint, so concurrent per-page tasks never contend.
#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Load a story by id.
    async fn load_story(&self, story_id: Uuid) -> AesopResult<Story>;

    /// List a story's pages ordered by ascending `page_number`.
    async fn list_pages(&self, story_id: Uuid) -> AesopResult<Vec<StoryPage>>;

    /// List the story's pages that still lack an image reference, ordered by
    /// ascending `page_number`.
    async fn pages_missing_image(&self, story_id: Uuid) -> AesopResult<Vec<StoryPage>>;

    /// Record a page's illustration reference and the prompt that produced it.
    async fn update_page_image(
        &self,
        page_id: Uuid,
        image: &ImageSource,
        prompt: &str,
    ) -> AesopResult<()>;

    /// Update a story's status, replacing the stored failure summary.
    async fn update_story_status(
        &self,
        story_id: Uuid,
        status: StoryStatus,
        failure_summary: Option<&str>,
    ) -> AesopResult<()>;

    /// Record the object-store key of the story's exported document.
    async fn set_story_document(&self, story_id: Uuid, key: &str) -> AesopResult<()>;

    /// Load a character sheet by id.
    async fn load_character(&self, character_id: Uuid) -> AesopResult<CharacterSheet>;

    /// Record the start of a generation run, returning the attempt id.
    async fn begin_attempt(&self, story_id: Uuid, kind: GenerationKind) -> AesopResult<Uuid>;

    /// Load the most recently started generation attempt for a story, if
    /// any. This is what status polling surfaces to the user.
    async fn latest_attempt(&self, story_id: Uuid) -> AesopResult<Option<GenerationAttempt>>;

    /// Record the outcome of a generation run.
    async fn finish_attempt(
        &self,
        attempt_id: Uuid,
        status: AttemptStatus,
        error_message: Option<&str>,
    ) -> AesopResult<()>;
}

/// Bounded download of remote illustrations for document assembly.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch `url` under the implementation's timeout and byte ceiling.
    async fn fetch(&self, url: &str) -> AesopResult<Vec<u8>>;
}
