//! Async adapter implementing the `StoryStore` capability over diesel.
//!
//! Diesel is synchronous; the orchestrator is async. Each call checks a
//! connection out of the r2d2 pool inside `spawn_blocking` so database work
//! never blocks the async executor.

use crate::{
    DatabaseResult, NewGenerationAttemptRow, PgPool, PostgresStoryRepository, StoryRepository,
};
use aesop_core::{
    AttemptStatus, CharacterSheet, GenerationAttempt, GenerationKind, ImageSource, Story,
    StoryPage, StoryStatus,
};
use aesop_error::{AesopError, AesopResult, DatabaseError, DatabaseErrorKind};
use aesop_interface::StoryStore;
use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use uuid::Uuid;

/// Postgres-backed implementation of [`StoryStore`].
#[derive(Clone)]
pub struct PgStoryStore {
    pool: PgPool,
}

impl std::fmt::Debug for PgStoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStoryStore").finish_non_exhaustive()
    }
}

impl PgStoryStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run a synchronous repository operation on the blocking thread pool.
    async fn with_conn<T, F>(&self, op: F) -> AesopResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> DatabaseResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        let result = tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| DatabaseError::new(DatabaseErrorKind::Pool(e.to_string())))?;
            op(&mut conn)
        })
        .await
        .map_err(|e| {
            DatabaseError::new(DatabaseErrorKind::Query(format!(
                "blocking task failed: {}",
                e
            )))
        })?;

        result.map_err(AesopError::from)
    }
}

#[async_trait]
impl StoryStore for PgStoryStore {
    #[tracing::instrument(skip(self), fields(story_id = %story_id))]
    async fn load_story(&self, story_id: Uuid) -> AesopResult<Story> {
        self.with_conn(move |conn| {
            let row = PostgresStoryRepository::new(conn).get_story(story_id)?;
            Story::try_from(row)
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(story_id = %story_id))]
    async fn list_pages(&self, story_id: Uuid) -> AesopResult<Vec<StoryPage>> {
        self.with_conn(move |conn| {
            PostgresStoryRepository::new(conn)
                .list_pages(story_id)?
                .into_iter()
                .map(StoryPage::try_from)
                .collect()
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(story_id = %story_id))]
    async fn pages_missing_image(&self, story_id: Uuid) -> AesopResult<Vec<StoryPage>> {
        self.with_conn(move |conn| {
            PostgresStoryRepository::new(conn)
                .pages_missing_image(story_id)?
                .into_iter()
                .map(StoryPage::try_from)
                .collect()
        })
        .await
    }

    #[tracing::instrument(skip(self, image, prompt), fields(page_id = %page_id))]
    async fn update_page_image(
        &self,
        page_id: Uuid,
        image: &ImageSource,
        prompt: &str,
    ) -> AesopResult<()> {
        let image_ref = image.as_ref_str().to_string();
        let prompt = prompt.to_string();
        self.with_conn(move |conn| {
            PostgresStoryRepository::new(conn).set_page_image(page_id, &image_ref, &prompt)
        })
        .await
    }

    #[tracing::instrument(skip(self, failure_summary), fields(story_id = %story_id, status = %status))]
    async fn update_story_status(
        &self,
        story_id: Uuid,
        status: StoryStatus,
        failure_summary: Option<&str>,
    ) -> AesopResult<()> {
        let status = status.to_string();
        let summary = failure_summary.map(str::to_string);
        self.with_conn(move |conn| {
            PostgresStoryRepository::new(conn).set_story_status(
                story_id,
                &status,
                summary.as_deref(),
            )
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(story_id = %story_id, key = %key))]
    async fn set_story_document(&self, story_id: Uuid, key: &str) -> AesopResult<()> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            PostgresStoryRepository::new(conn).set_story_document(story_id, &key)
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(character_id = %character_id))]
    async fn load_character(&self, character_id: Uuid) -> AesopResult<CharacterSheet> {
        self.with_conn(move |conn| {
            let row = PostgresStoryRepository::new(conn).get_character(character_id)?;
            Ok(CharacterSheet::from(row))
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(story_id = %story_id, kind = %kind))]
    async fn begin_attempt(&self, story_id: Uuid, kind: GenerationKind) -> AesopResult<Uuid> {
        let row = NewGenerationAttemptRow {
            id: Uuid::new_v4(),
            story_id,
            kind: kind.to_string(),
            status: AttemptStatus::InProgress.to_string(),
            started_at: Utc::now(),
        };
        self.with_conn(move |conn| {
            let inserted = PostgresStoryRepository::new(conn).insert_attempt(row)?;
            Ok(inserted.id)
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(story_id = %story_id))]
    async fn latest_attempt(&self, story_id: Uuid) -> AesopResult<Option<GenerationAttempt>> {
        self.with_conn(move |conn| {
            PostgresStoryRepository::new(conn)
                .latest_attempt(story_id)?
                .map(GenerationAttempt::try_from)
                .transpose()
        })
        .await
    }

    #[tracing::instrument(skip(self, error_message), fields(attempt_id = %attempt_id, status = %status))]
    async fn finish_attempt(
        &self,
        attempt_id: Uuid,
        status: AttemptStatus,
        error_message: Option<&str>,
    ) -> AesopResult<()> {
        let status = status.to_string();
        let error = error_message.map(str::to_string);
        self.with_conn(move |conn| {
            PostgresStoryRepository::new(conn).update_attempt(
                attempt_id,
                &status,
                error.as_deref(),
                Some(Utc::now()),
            )
        })
        .await
    }
}
