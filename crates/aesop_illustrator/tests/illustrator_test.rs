//! Integration tests for the illustration orchestrator, using in-memory
//! fakes for the generator, store, and repository.

use aesop_core::{
    AttemptStatus, CharacterSheet, GeneratedImage, GenerationKind, IllustratorConfig,
    ImageRequest, ImageSource, Story, StoryPage, StoryStatus,
};
use aesop_error::{
    AesopResult, ImageGenError, ImageGenErrorKind, PipelineError, PipelineErrorKind,
};
use aesop_illustrator::Illustrator;
use aesop_interface::{ImageGenerator, MediaStore, StoredObject, StoryStore};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ─── Fakes ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
enum Mode {
    Ok,
    AlwaysRateLimit,
    PolicyIfContains(&'static str),
}

struct Rule {
    marker: &'static str,
    mode: Mode,
}

/// Image generator scripted per page marker, counting calls.
#[derive(Clone)]
struct ScriptedGenerator {
    rules: Arc<Vec<Rule>>,
    calls: Arc<Mutex<HashMap<String, u32>>>,
}

impl ScriptedGenerator {
    fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules: Arc::new(rules),
            calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn calls_for(&self, marker: &str) -> u32 {
        self.calls.lock().unwrap().get(marker).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ImageGenerator for ScriptedGenerator {
    async fn generate(&self, req: &ImageRequest) -> AesopResult<GeneratedImage> {
        let rule = self
            .rules
            .iter()
            .find(|rule| req.prompt.contains(rule.marker));

        if let Some(rule) = rule {
            *self
                .calls
                .lock()
                .unwrap()
                .entry(rule.marker.to_string())
                .or_insert(0) += 1;

            match &rule.mode {
                Mode::Ok => {}
                Mode::AlwaysRateLimit => {
                    return Err(ImageGenError::new(ImageGenErrorKind::RateLimited(
                        "quota exceeded".to_string(),
                    ))
                    .into());
                }
                Mode::PolicyIfContains(banned) => {
                    if req.prompt.contains(banned) {
                        return Err(ImageGenError::new(ImageGenErrorKind::ContentPolicy(
                            "rejected by safety system".to_string(),
                        ))
                        .into());
                    }
                }
            }
        }

        Ok(GeneratedImage {
            b64_json: STANDARD.encode(b"fake png bytes"),
            mime: "image/png".to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-1"
    }
}

/// Object store backed by a map.
#[derive(Clone, Default)]
struct InMemoryStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryStore {
    fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
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
    character: Option<CharacterSheet>,
    attempts: Vec<(Uuid, AttemptStatus, Option<String>)>,
}

/// Story repository backed by a mutex-guarded state blob.
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
                character: None,
                attempts: Vec::new(),
            })),
        }
    }

    fn story_status(&self) -> StoryStatus {
        self.state.lock().unwrap().story.status
    }

    fn failure_summary(&self) -> Option<String> {
        self.state.lock().unwrap().story.failure_summary.clone()
    }

    fn page_image(&self, page_number: i32) -> Option<ImageSource> {
        let state = self.state.lock().unwrap();
        state
            .pages
            .iter()
            .find(|p| p.page_number == page_number)
            .and_then(|p| p.image.clone())
    }

    fn attempts(&self) -> Vec<(Uuid, AttemptStatus, Option<String>)> {
        self.state.lock().unwrap().attempts.clone()
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
        self.state
            .lock()
            .unwrap()
            .character
            .clone()
            .ok_or_else(|| {
                PipelineError::new(PipelineErrorKind::CharacterNotFound(
                    character_id.to_string(),
                ))
                .into()
            })
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
    ) -> AesopResult<Option<aesop_core::GenerationAttempt>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .attempts
            .last()
            .map(|(id, status, error)| aesop_core::GenerationAttempt {
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

fn story(status: StoryStatus) -> Story {
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
        status,
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
        kind: aesop_core::PageKind::Story,
        content: content.to_string(),
        image: None,
        image_prompt: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn fast_config() -> IllustratorConfig {
    IllustratorConfig {
        stagger_ms: 0,
        retry_rounds: 5,
        base_delay_ms: 0,
        extra_round_delay_ms: 0,
        conservative_from_round: 2,
        db_update_retries: 3,
        run_budget_secs: None,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn all_pages_succeed_on_first_pass() {
    let story = story(StoryStatus::Draft);
    let story_id = story.id;
    let pages = vec![
        page(story_id, 1, "the fox wakes at dawn"),
        page(story_id, 2, "the fox crosses the bridge"),
        page(story_id, 3, "the fox lights the lantern"),
    ];
    let repo = InMemoryRepo::new(story, pages);
    let store = InMemoryStore::default();
    let generator = ScriptedGenerator::new(vec![]);

    let illustrator =
        Illustrator::new(generator.clone(), store.clone(), repo.clone(), fast_config());
    let report = illustrator.run(story_id).await.unwrap();

    assert_eq!(report.status, StoryStatus::Completed);
    assert_eq!(report.total_pages, 3);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(report.rounds_used, 0);
    assert!((report.success_rate() - 1.0).abs() < f64::EPSILON);

    // One storage object per page, pages hold stored references
    assert_eq!(store.len(), 3);
    for number in 1..=3 {
        assert!(matches!(
            repo.page_image(number),
            Some(ImageSource::Stored(_))
        ));
    }

    assert_eq!(repo.story_status(), StoryStatus::Completed);
    assert_eq!(repo.failure_summary(), None);

    let attempts = repo.attempts();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].1, AttemptStatus::Completed);
}

#[tokio::test]
async fn persistent_rate_limit_fails_story_and_bounds_attempts() {
    let story = story(StoryStatus::Draft);
    let story_id = story.id;
    let pages = vec![
        page(story_id, 1, "the fox wakes at dawn"),
        page(story_id, 2, "the stubborn bridge crossing"),
        page(story_id, 3, "the fox lights the lantern"),
    ];
    let repo = InMemoryRepo::new(story, pages);
    let store = InMemoryStore::default();
    let generator = ScriptedGenerator::new(vec![Rule {
        marker: "stubborn bridge",
        mode: Mode::AlwaysRateLimit,
    }]);

    let illustrator =
        Illustrator::new(generator.clone(), store.clone(), repo.clone(), fast_config());
    let report = illustrator.run(story_id).await.unwrap();

    assert_eq!(report.status, StoryStatus::Failed);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);

    // 1 initial attempt + 5 retry rounds, never more
    assert_eq!(generator.calls_for("stubborn bridge"), 6);

    assert!(repo.page_image(1).is_some());
    assert!(repo.page_image(2).is_none());
    assert!(repo.page_image(3).is_some());

    assert_eq!(repo.story_status(), StoryStatus::Failed);
    let summary = repo.failure_summary().unwrap();
    assert!(summary.contains("pages 2"), "summary was {:?}", summary);

    let attempts = repo.attempts();
    assert_eq!(attempts[0].1, AttemptStatus::Failed);
    assert!(attempts[0].2.is_some());
}

#[tokio::test]
async fn content_policy_rejection_recovers_with_conservative_prompt() {
    let story = story(StoryStatus::Draft);
    let story_id = story.id;
    let pages = vec![page(story_id, 1, "the monster under the bed waves hello")];
    let repo = InMemoryRepo::new(story, pages);
    let store = InMemoryStore::default();
    // Rejects while the prompt still contains "monster"; the conservative
    // tier rewrites it to "friendly animal" and the call succeeds.
    let generator = ScriptedGenerator::new(vec![Rule {
        marker: "under the bed",
        mode: Mode::PolicyIfContains("monster"),
    }]);

    let illustrator =
        Illustrator::new(generator.clone(), store.clone(), repo.clone(), fast_config());
    let report = illustrator.run(story_id).await.unwrap();

    assert_eq!(report.status, StoryStatus::Completed);
    // initial + round 1 (normal tier, still rejected) + round 2 (conservative)
    assert_eq!(generator.calls_for("under the bed"), 3);
    assert_eq!(report.rounds_used, 2);

    let prompt = repo
        .state
        .lock()
        .unwrap()
        .pages[0]
        .image_prompt
        .clone()
        .unwrap();
    assert!(prompt.contains("friendly animal"));
    assert!(!prompt.contains("monster"));
}

#[tokio::test]
async fn exhausted_budget_stops_retries_and_keeps_partial_results() {
    let story = story(StoryStatus::Draft);
    let story_id = story.id;
    let pages = vec![
        page(story_id, 1, "the fox wakes at dawn"),
        page(story_id, 2, "the stubborn bridge crossing"),
    ];
    let repo = InMemoryRepo::new(story, pages);
    let store = InMemoryStore::default();
    let generator = ScriptedGenerator::new(vec![Rule {
        marker: "stubborn bridge",
        mode: Mode::AlwaysRateLimit,
    }]);

    let mut config = fast_config();
    config.run_budget_secs = Some(0);
    let illustrator = Illustrator::new(generator.clone(), store.clone(), repo.clone(), config);
    let report = illustrator.run(story_id).await.unwrap();

    assert_eq!(report.status, StoryStatus::Failed);
    assert!(report.budget_exhausted);
    // Only the first pass ran
    assert_eq!(generator.calls_for("stubborn bridge"), 1);
    // The page that succeeded on the first pass is kept
    assert!(repo.page_image(1).is_some());
    assert!(
        repo.failure_summary().unwrap().contains("budget exhausted"),
        "summary: {:?}",
        repo.failure_summary()
    );
}

#[tokio::test]
async fn manual_retry_only_regenerates_missing_pages() {
    let story = story(StoryStatus::Failed);
    let story_id = story.id;
    let mut page1 = page(story_id, 1, "the fox wakes at dawn");
    page1.image = Some(ImageSource::Stored("stories/x/page-01.png".to_string()));
    let pages = vec![page1, page(story_id, 2, "the fox crosses the bridge")];
    let repo = InMemoryRepo::new(story, pages);
    let store = InMemoryStore::default();
    let generator = ScriptedGenerator::new(vec![
        Rule {
            marker: "wakes at dawn",
            mode: Mode::Ok,
        },
        Rule {
            marker: "crosses the bridge",
            mode: Mode::Ok,
        },
    ]);

    let illustrator =
        Illustrator::new(generator.clone(), store.clone(), repo.clone(), fast_config());
    let report = illustrator.run(story_id).await.unwrap();

    assert_eq!(report.status, StoryStatus::Completed);
    assert_eq!(generator.calls_for("wakes at dawn"), 0);
    assert_eq!(generator.calls_for("crosses the bridge"), 1);
}

#[tokio::test]
async fn concurrent_run_is_rejected_by_state_machine() {
    let story = story(StoryStatus::Generating);
    let story_id = story.id;
    let pages = vec![page(story_id, 1, "the fox wakes at dawn")];
    let repo = InMemoryRepo::new(story, pages);

    let illustrator = Illustrator::new(
        ScriptedGenerator::new(vec![]),
        InMemoryStore::default(),
        repo.clone(),
        fast_config(),
    );

    let err = illustrator.run(story_id).await.unwrap_err();
    assert!(format!("{}", err).contains("Invalid status transition"));
    assert!(repo.attempts().is_empty());
}

#[tokio::test]
async fn story_without_pages_is_an_error() {
    let story = story(StoryStatus::Draft);
    let story_id = story.id;
    let repo = InMemoryRepo::new(story, Vec::new());

    let illustrator = Illustrator::new(
        ScriptedGenerator::new(vec![]),
        InMemoryStore::default(),
        repo,
        fast_config(),
    );

    let err = illustrator.run(story_id).await.unwrap_err();
    assert!(format!("{}", err).contains("no pages"));
}
