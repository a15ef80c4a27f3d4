//! End-to-end pipeline test: illustrate a story with in-memory fakes, then
//! export it and verify the finished PDF.

use aesop::{
    AesopConfig, AttemptStatus, DocumentConfig, GeneratedImage, GenerationKind,
    IllustratorConfig, ImageFetcher, ImageGenerator, ImageRequest, ImageSource, MediaStore,
    PageKind, Story, StoryPage, StoryStatus, StoryStore, StorybookPipeline, StoredObject,
};
use aesop::{AesopResult, CharacterSheet};
use aesop_error::{DocumentError, DocumentErrorKind, PipelineError, PipelineErrorKind};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use image::{ImageFormat, Rgb, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ─── Fakes ──────────────────────────────────────────────────────────────────

/// Generator that always returns a small PNG.
struct PngGenerator;

#[async_trait]
impl ImageGenerator for PngGenerator {
    async fn generate(&self, _req: &ImageRequest) -> AesopResult<GeneratedImage> {
        let img = RgbImage::from_pixel(16, 12, Rgb([250, 180, 60]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .expect("encode png");
        Ok(GeneratedImage {
            b64_json: STANDARD.encode(out),
            mime: "image/png".to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fixture"
    }

    fn model_name(&self) -> &str {
        "fixture-1"
    }
}

/// Fetcher that refuses every URL; the pipeline under test only uses stored
/// references.
struct NoFetcher;

#[async_trait]
impl ImageFetcher for NoFetcher {
    async fn fetch(&self, url: &str) -> AesopResult<Vec<u8>> {
        Err(DocumentError::new(DocumentErrorKind::Fetch(format!("offline: {}", url))).into())
    }
}

#[derive(Clone, Default)]
struct InMemoryStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

#[async_trait]
impl MediaStore for InMemoryStore {
    async fn put(&self, key: &str, data: &[u8], _mime: &str) -> AesopResult<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
        Ok(StoredObject {
            key: key.to_string(),
            url: format!("mem://{}", key),
            sha256: String::new(),
            size_bytes: data.len() as i64,
        })
    }

    async fn get(&self, key: &str) -> AesopResult<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| {
                aesop_error::StorageError::new(aesop_error::StorageErrorKind::NotFound(
                    key.to_string(),
                ))
                .into()
            })
    }

    async fn exists(&self, key: &str) -> AesopResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn delete(&self, key: &str) -> AesopResult<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

struct RepoState {
    story: Story,
    pages: Vec<StoryPage>,
    attempts: Vec<(Uuid, AttemptStatus, Option<String>)>,
}

#[derive(Clone)]
struct InMemoryRepo {
    state: Arc<Mutex<RepoState>>,
}

impl InMemoryRepo {
    fn new(story: Story, pages: Vec<StoryPage>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RepoState {
                story,
                pages,
                attempts: Vec::new(),
            })),
        }
    }

    fn document_key(&self) -> Option<String> {
        self.state.lock().unwrap().story.document_key.clone()
    }
}

#[async_trait]
impl StoryStore for InMemoryRepo {
    async fn load_story(&self, _story_id: Uuid) -> AesopResult<Story> {
        Ok(self.state.lock().unwrap().story.clone())
    }

    async fn list_pages(&self, _story_id: Uuid) -> AesopResult<Vec<StoryPage>> {
        let mut pages = self.state.lock().unwrap().pages.clone();
        pages.sort_by_key(|p| p.page_number);
        Ok(pages)
    }

    async fn pages_missing_image(&self, _story_id: Uuid) -> AesopResult<Vec<StoryPage>> {
        let mut pages: Vec<StoryPage> = self
            .state
            .lock()
            .unwrap()
            .pages
            .iter()
            .filter(|p| p.missing_image())
            .cloned()
            .collect();
        pages.sort_by_key(|p| p.page_number);
        Ok(pages)
    }

    async fn update_page_image(
        &self,
        page_id: Uuid,
        image: &ImageSource,
        prompt: &str,
    ) -> AesopResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(page) = state.pages.iter_mut().find(|p| p.id == page_id) {
            page.image = Some(image.clone());
            page.image_prompt = Some(prompt.to_string());
        }
        Ok(())
    }

    async fn update_story_status(
        &self,
        _story_id: Uuid,
        status: StoryStatus,
        failure_summary: Option<&str>,
    ) -> AesopResult<()> {
        let mut state = self.state.lock().unwrap();
        state.story.status = status;
        state.story.failure_summary = failure_summary.map(str::to_string);
        Ok(())
    }

    async fn set_story_document(&self, _story_id: Uuid, key: &str) -> AesopResult<()> {
        self.state.lock().unwrap().story.document_key = Some(key.to_string());
        Ok(())
    }

    async fn load_character(&self, character_id: Uuid) -> AesopResult<CharacterSheet> {
        Err(PipelineError::new(PipelineErrorKind::CharacterNotFound(
            character_id.to_string(),
        ))
        .into())
    }

    async fn begin_attempt(&self, _story_id: Uuid, _kind: GenerationKind) -> AesopResult<Uuid> {
        let id = Uuid::new_v4();
        self.state
            .lock()
            .unwrap()
            .attempts
            .push((id, AttemptStatus::InProgress, None));
        Ok(id)
    }

    async fn latest_attempt(
        &self,
        story_id: Uuid,
    ) -> AesopResult<Option<aesop::GenerationAttempt>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .attempts
            .last()
            .map(|(id, status, error)| aesop::GenerationAttempt {
                id: *id,
                story_id,
                kind: GenerationKind::Illustrations,
                status: *status,
                error_message: error.clone(),
                started_at: Utc::now(),
                finished_at: None,
            }))
    }

    async fn finish_attempt(
        &self,
        attempt_id: Uuid,
        status: AttemptStatus,
        error_message: Option<&str>,
    ) -> AesopResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(attempt) = state.attempts.iter_mut().find(|(id, _, _)| *id == attempt_id) {
            attempt.1 = status;
            attempt.2 = error_message.map(str::to_string);
        }
        Ok(())
    }
}

// ─── Fixtures ───────────────────────────────────────────────────────────────

fn story() -> Story {
    Story {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        character_sheet_id: None,
        title: "The Paper Lantern".to_string(),
        prompt: "a fox finds a lantern".to_string(),
        child_name: "Mira".to_string(),
        child_age: 6,
        themes: vec!["adventure".to_string()],
        art_style: "watercolor".to_string(),
        page_count: 3,
        reading_level: "early".to_string(),
        language: "en".to_string(),
        status: StoryStatus::Draft,
        like_count: 0,
        document_key: None,
        failure_summary: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn page(story_id: Uuid, number: i32, content: &str) -> StoryPage {
    StoryPage {
        id: Uuid::new_v4(),
        story_id,
        page_number: number,
        kind: PageKind::Story,
        content: content.to_string(),
        image: None,
        image_prompt: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn test_config() -> AesopConfig {
    AesopConfig {
        illustrator: IllustratorConfig {
            stagger_ms: 0,
            base_delay_ms: 0,
            extra_round_delay_ms: 0,
            ..IllustratorConfig::default()
        },
        document: DocumentConfig::default(),
        ..AesopConfig::default()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn illustrate_then_export_produces_a_complete_storybook() {
    let story = story();
    let story_id = story.id;
    let pages = vec![
        page(story_id, 1, "The fox wakes at dawn."),
        page(story_id, 2, "The fox crosses the old bridge."),
        page(story_id, 3, "The fox lights the paper lantern."),
    ];
    let repo = InMemoryRepo::new(story, pages);
    let store = InMemoryStore::default();
    let config = test_config();

    let pipeline = StorybookPipeline::new(
        PngGenerator,
        store.clone(),
        repo.clone(),
        NoFetcher,
        &config,
    );

    // Illustration pass: every page succeeds on the first attempt.
    let report = pipeline.illustrate(story_id).await.unwrap();
    assert_eq!(report.status, StoryStatus::Completed);
    assert_eq!(report.succeeded, 3);

    // Status polling sees the completed story and its finished attempt.
    let (polled, attempt) = pipeline.status(story_id).await.unwrap();
    assert_eq!(polled.status, StoryStatus::Completed);
    assert_eq!(attempt.unwrap().status, AttemptStatus::Completed);

    // Three illustrations landed in the object store.
    let illustration_count = store
        .objects
        .lock()
        .unwrap()
        .keys()
        .filter(|key| key.contains("/pages/"))
        .count();
    assert_eq!(illustration_count, 3);

    // Export: cover + three content pages, key recorded on the story.
    let stored = pipeline.export(story_id).await.unwrap();
    assert!(stored.key.ends_with(".pdf"));
    assert_eq!(repo.document_key(), Some(stored.key.clone()));

    let bytes = store.get(&stored.key).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 4);

    let text = doc.extract_text(&[2]).unwrap();
    assert!(text.contains("The fox wakes at dawn"));
    assert!(!text.contains(aesop::IMAGE_PLACEHOLDER));
}

#[tokio::test]
async fn export_of_a_failed_story_still_produces_a_document() {
    let mut story = story();
    story.status = StoryStatus::Failed;
    let story_id = story.id;
    // Page 2 never got an illustration
    let mut page1 = page(story_id, 1, "The fox wakes at dawn.");
    page1.image = Some(ImageSource::Base64("data:image/png;base64,broken!".to_string()));
    let pages = vec![page1, page(story_id, 2, "The fox crosses the old bridge.")];
    let repo = InMemoryRepo::new(story, pages);
    let store = InMemoryStore::default();
    let config = test_config();

    let pipeline = StorybookPipeline::new(
        PngGenerator,
        store.clone(),
        repo.clone(),
        NoFetcher,
        &config,
    );

    let stored = pipeline.export(story_id).await.unwrap();
    let bytes = store.get(&stored.key).await.unwrap();
    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 3);

    // Broken inline payload degrades to a placeholder, text intact.
    let first = doc.extract_text(&[2]).unwrap();
    assert!(first.contains(aesop::IMAGE_PLACEHOLDER));
    assert!(first.contains("The fox wakes at dawn"));

    // The never-illustrated page renders text only.
    let second = doc.extract_text(&[3]).unwrap();
    assert!(second.contains("The fox crosses the old bridge"));
}
