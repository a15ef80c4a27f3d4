//! Synchronous diesel repository.

use crate::schema::{character_sheets, stories, story_generations, story_pages};
use crate::{
    CharacterSheetRow, DatabaseResult, GenerationAttemptRow, NewGenerationAttemptRow,
    NewStoryPageRow, NewStoryRow, StoryPageRow, StoryRow,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Repository trait for story persistence operations.
///
/// Every write is a single-row, partial-column update; last-writer-wins is
/// acceptable because no two concurrent pipeline tasks ever target the same
/// row.
pub trait StoryRepository {
    /// Insert a story row, as submitted by the creation wizard.
    fn insert_story(&mut self, row: NewStoryRow) -> DatabaseResult<StoryRow>;

    /// Insert a story's page rows.
    fn insert_pages(&mut self, rows: Vec<NewStoryPageRow>) -> DatabaseResult<usize>;

    /// Load a story row by id.
    fn get_story(&mut self, story_id: Uuid) -> DatabaseResult<StoryRow>;

    /// List a story's pages ordered by ascending page number.
    fn list_pages(&mut self, story_id: Uuid) -> DatabaseResult<Vec<StoryPageRow>>;

    /// List a story's pages that have no image reference yet, ordered by
    /// ascending page number.
    fn pages_missing_image(&mut self, story_id: Uuid) -> DatabaseResult<Vec<StoryPageRow>>;

    /// Set a page's image reference and the prompt that produced it.
    fn set_page_image(
        &mut self,
        page_id: Uuid,
        image_ref: &str,
        image_prompt: &str,
    ) -> DatabaseResult<()>;

    /// Set a story's status and failure summary.
    fn set_story_status(
        &mut self,
        story_id: Uuid,
        status: &str,
        failure_summary: Option<&str>,
    ) -> DatabaseResult<()>;

    /// Record the object-store key of the story's exported document.
    fn set_story_document(&mut self, story_id: Uuid, document_key: &str) -> DatabaseResult<()>;

    /// Load a character sheet row by id.
    fn get_character(&mut self, character_id: Uuid) -> DatabaseResult<CharacterSheetRow>;

    /// Insert a generation attempt row.
    fn insert_attempt(
        &mut self,
        row: NewGenerationAttemptRow,
    ) -> DatabaseResult<GenerationAttemptRow>;

    /// Load the most recently started generation attempt for a story.
    fn latest_attempt(&mut self, story_id: Uuid) -> DatabaseResult<Option<GenerationAttemptRow>>;

    /// Update a generation attempt's outcome.
    fn update_attempt(
        &mut self,
        attempt_id: Uuid,
        status: &str,
        error_message: Option<&str>,
        finished_at: Option<DateTime<Utc>>,
    ) -> DatabaseResult<()>;
}

/// PostgreSQL implementation of [`StoryRepository`].
///
/// Uses a mutable reference to PgConnection. For concurrent access, wrap a
/// pool and check connections out per call (see `PgStoryStore`).
pub struct PostgresStoryRepository<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> PostgresStoryRepository<'a> {
    /// Create a repository over a borrowed connection.
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }
}

impl StoryRepository for PostgresStoryRepository<'_> {
    fn insert_story(&mut self, row: NewStoryRow) -> DatabaseResult<StoryRow> {
        let inserted = diesel::insert_into(stories::table)
            .values(&row)
            .get_result::<StoryRow>(self.conn)?;
        Ok(inserted)
    }

    fn insert_pages(&mut self, rows: Vec<NewStoryPageRow>) -> DatabaseResult<usize> {
        let count = diesel::insert_into(story_pages::table)
            .values(&rows)
            .execute(self.conn)?;
        Ok(count)
    }

    fn get_story(&mut self, story_id: Uuid) -> DatabaseResult<StoryRow> {
        let row = stories::table
            .filter(stories::id.eq(story_id))
            .first::<StoryRow>(self.conn)?;
        Ok(row)
    }

    fn list_pages(&mut self, story_id: Uuid) -> DatabaseResult<Vec<StoryPageRow>> {
        let rows = story_pages::table
            .filter(story_pages::story_id.eq(story_id))
            .order(story_pages::page_number.asc())
            .load::<StoryPageRow>(self.conn)?;
        Ok(rows)
    }

    fn pages_missing_image(&mut self, story_id: Uuid) -> DatabaseResult<Vec<StoryPageRow>> {
        let rows = story_pages::table
            .filter(story_pages::story_id.eq(story_id))
            .filter(
                story_pages::image_ref
                    .is_null()
                    .or(story_pages::image_ref.eq("")),
            )
            .order(story_pages::page_number.asc())
            .load::<StoryPageRow>(self.conn)?;
        Ok(rows)
    }

    fn set_page_image(
        &mut self,
        page_id: Uuid,
        image_ref: &str,
        image_prompt: &str,
    ) -> DatabaseResult<()> {
        diesel::update(story_pages::table.filter(story_pages::id.eq(page_id)))
            .set((
                story_pages::image_ref.eq(image_ref),
                story_pages::image_prompt.eq(image_prompt),
                story_pages::updated_at.eq(Utc::now()),
            ))
            .execute(self.conn)?;
        Ok(())
    }

    fn set_story_status(
        &mut self,
        story_id: Uuid,
        status: &str,
        failure_summary: Option<&str>,
    ) -> DatabaseResult<()> {
        diesel::update(stories::table.filter(stories::id.eq(story_id)))
            .set((
                stories::status.eq(status),
                stories::failure_summary.eq(failure_summary),
                stories::updated_at.eq(Utc::now()),
            ))
            .execute(self.conn)?;
        Ok(())
    }

    fn set_story_document(&mut self, story_id: Uuid, document_key: &str) -> DatabaseResult<()> {
        diesel::update(stories::table.filter(stories::id.eq(story_id)))
            .set((
                stories::document_key.eq(document_key),
                stories::updated_at.eq(Utc::now()),
            ))
            .execute(self.conn)?;
        Ok(())
    }

    fn get_character(&mut self, character_id: Uuid) -> DatabaseResult<CharacterSheetRow> {
        let row = character_sheets::table
            .filter(character_sheets::id.eq(character_id))
            .first::<CharacterSheetRow>(self.conn)?;
        Ok(row)
    }

    fn insert_attempt(
        &mut self,
        row: NewGenerationAttemptRow,
    ) -> DatabaseResult<GenerationAttemptRow> {
        let inserted = diesel::insert_into(story_generations::table)
            .values(&row)
            .get_result::<GenerationAttemptRow>(self.conn)?;
        Ok(inserted)
    }

    fn latest_attempt(&mut self, story_id: Uuid) -> DatabaseResult<Option<GenerationAttemptRow>> {
        let row = story_generations::table
            .filter(story_generations::story_id.eq(story_id))
            .order(story_generations::started_at.desc())
            .first::<GenerationAttemptRow>(self.conn)
            .optional()?;
        Ok(row)
    }

    fn update_attempt(
        &mut self,
        attempt_id: Uuid,
        status: &str,
        error_message: Option<&str>,
        finished_at: Option<DateTime<Utc>>,
    ) -> DatabaseResult<()> {
        diesel::update(story_generations::table.filter(story_generations::id.eq(attempt_id)))
            .set((
                story_generations::status.eq(status),
                story_generations::error_message.eq(error_message),
                story_generations::finished_at.eq(finished_at),
            ))
            .execute(self.conn)?;
        Ok(())
    }
}
