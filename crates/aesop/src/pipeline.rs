//! End-to-end pipeline wiring.

use aesop_core::{AesopConfig, GenerationAttempt, Story, StoryPage};
use aesop_error::AesopResult;
use aesop_illustrator::{IllustrationReport, Illustrator};
use aesop_interface::{ImageFetcher, ImageGenerator, MediaStore, StoredObject, StoryStore};
use aesop_document::DocumentAssembler;
use tracing::{info, instrument};
use uuid::Uuid;

/// Wires the illustration orchestrator and the document assembler over one
/// set of capabilities.
///
/// The client flow this serves: request illustration (detached from the
/// HTTP request/response), poll story status, then request export, which
/// assembles synchronously and uploads the finished document.
pub struct StorybookPipeline<G, S, R, F> {
    illustrator: Illustrator<G, S, R>,
    assembler: DocumentAssembler<F, S>,
    repo: R,
    store: S,
}

impl<G, S, R, F> StorybookPipeline<G, S, R, F>
where
    G: ImageGenerator,
    S: MediaStore + Clone,
    R: StoryStore + Clone,
    F: ImageFetcher,
{
    /// Build a pipeline from its collaborators and configuration sections.
    pub fn new(generator: G, store: S, repo: R, fetcher: F, config: &AesopConfig) -> Self {
        let illustrator = Illustrator::new(
            generator,
            store.clone(),
            repo.clone(),
            config.illustrator.clone(),
        );
        let assembler = DocumentAssembler::new(fetcher, store.clone(), config.document.clone());
        Self {
            illustrator,
            assembler,
            repo,
            store,
        }
    }

    /// Run one illustration orchestration pass for the story.
    pub async fn illustrate(&self, story_id: Uuid) -> AesopResult<IllustrationReport> {
        self.illustrator.run(story_id).await
    }

    /// Assemble the story's PDF, upload it, and record its key.
    #[instrument(skip(self), fields(story_id = %story_id))]
    pub async fn export(&self, story_id: Uuid) -> AesopResult<StoredObject> {
        let story: Story = self.repo.load_story(story_id).await?;
        let pages: Vec<StoryPage> = self.repo.list_pages(story_id).await?;

        let bytes = self.assembler.assemble(&story, &pages).await?;

        let key = format!(
            "stories/{}/storybook-{}.pdf",
            story_id,
            chrono::Utc::now().timestamp_millis()
        );
        let stored = self.store.put(&key, &bytes, "application/pdf").await?;
        self.repo.set_story_document(story_id, &stored.key).await?;

        info!(key = %stored.key, bytes = stored.size_bytes, "Exported storybook");
        Ok(stored)
    }

    /// Current story status plus the latest generation attempt, the pair
    /// the client polls while illustrations generate.
    pub async fn status(
        &self,
        story_id: Uuid,
    ) -> AesopResult<(Story, Option<GenerationAttempt>)> {
        let story = self.repo.load_story(story_id).await?;
        let attempt = self.repo.latest_attempt(story_id).await?;
        Ok((story, attempt))
    }

    /// Access the underlying object store.
    pub fn store(&self) -> &S {
        &self.store
    }
}
