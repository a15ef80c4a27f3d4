//! Row models and domain conversions.

use crate::schema::{stories, story_generations, story_pages};
use aesop_core::{
    AttemptStatus, CharacterSheet, GenerationAttempt, GenerationKind, ImageSource, PageKind,
    Story, StoryPage, StoryStatus,
};
use aesop_error::{DatabaseError, DatabaseErrorKind};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::str::FromStr;
use uuid::Uuid;

/// One row of the `stories` table.
#[derive(Debug, Clone, Queryable)]
pub struct StoryRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub character_sheet_id: Option<Uuid>,
    pub title: String,
    pub prompt: String,
    pub child_name: String,
    pub child_age: i32,
    pub themes: Vec<String>,
    pub art_style: String,
    pub page_count: i32,
    pub reading_level: String,
    pub language: String,
    pub status: String,
    pub like_count: i32,
    pub document_key: Option<String>,
    pub failure_summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable story row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = stories)]
pub struct NewStoryRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub character_sheet_id: Option<Uuid>,
    pub title: String,
    pub prompt: String,
    pub child_name: String,
    pub child_age: i32,
    pub themes: Vec<String>,
    pub art_style: String,
    pub page_count: i32,
    pub reading_level: String,
    pub language: String,
    pub status: String,
}

/// One row of the `story_pages` table.
#[derive(Debug, Clone, Queryable)]
pub struct StoryPageRow {
    pub id: Uuid,
    pub story_id: Uuid,
    pub page_number: i32,
    pub kind: String,
    pub content: String,
    pub image_ref: Option<String>,
    pub image_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable story page row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = story_pages)]
pub struct NewStoryPageRow {
    pub id: Uuid,
    pub story_id: Uuid,
    pub page_number: i32,
    pub kind: String,
    pub content: String,
}

/// One row of the `character_sheets` table.
#[derive(Debug, Clone, Queryable)]
pub struct CharacterSheetRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub hair_color: String,
    pub hair_style: String,
    pub eye_color: String,
    pub skin_tone: String,
    pub outfit: String,
    pub accessory: String,
    pub distinctive_features: String,
    pub reference_image_url: Option<String>,
    pub like_count: i32,
    pub created_at: DateTime<Utc>,
}

/// One row of the `story_generations` table.
#[derive(Debug, Clone, Queryable)]
pub struct GenerationAttemptRow {
    pub id: Uuid,
    pub story_id: Uuid,
    pub kind: String,
    pub status: String,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Insertable generation attempt row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = story_generations)]
pub struct NewGenerationAttemptRow {
    pub id: Uuid,
    pub story_id: Uuid,
    pub kind: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
}

fn parse_enum<T: FromStr>(value: &str, what: &str) -> Result<T, DatabaseError> {
    T::from_str(value).map_err(|_| {
        DatabaseError::new(DatabaseErrorKind::InvalidValue(format!(
            "unknown {}: {:?}",
            what, value
        )))
    })
}

impl TryFrom<StoryRow> for Story {
    type Error = DatabaseError;

    fn try_from(row: StoryRow) -> Result<Self, Self::Error> {
        let status: StoryStatus = parse_enum(&row.status, "story status")?;
        Ok(Story {
            id: row.id,
            owner_id: row.owner_id,
            character_sheet_id: row.character_sheet_id,
            title: row.title,
            prompt: row.prompt,
            child_name: row.child_name,
            child_age: row.child_age,
            themes: row.themes,
            art_style: row.art_style,
            page_count: row.page_count,
            reading_level: row.reading_level,
            language: row.language,
            status,
            like_count: row.like_count,
            document_key: row.document_key,
            failure_summary: row.failure_summary,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<StoryPageRow> for StoryPage {
    type Error = DatabaseError;

    fn try_from(row: StoryPageRow) -> Result<Self, Self::Error> {
        let kind: PageKind = parse_enum(&row.kind, "page kind")?;
        let image = row
            .image_ref
            .as_deref()
            .filter(|r| !r.is_empty())
            .map(ImageSource::parse);
        Ok(StoryPage {
            id: row.id,
            story_id: row.story_id,
            page_number: row.page_number,
            kind,
            content: row.content,
            image,
            image_prompt: row.image_prompt,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<CharacterSheetRow> for CharacterSheet {
    fn from(row: CharacterSheetRow) -> Self {
        CharacterSheet {
            id: row.id,
            owner_id: row.owner_id,
            hair_color: row.hair_color,
            hair_style: row.hair_style,
            eye_color: row.eye_color,
            skin_tone: row.skin_tone,
            outfit: row.outfit,
            accessory: row.accessory,
            distinctive_features: row.distinctive_features,
            reference_image_url: row.reference_image_url,
            like_count: row.like_count,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<GenerationAttemptRow> for GenerationAttempt {
    type Error = DatabaseError;

    fn try_from(row: GenerationAttemptRow) -> Result<Self, Self::Error> {
        let kind: GenerationKind = parse_enum(&row.kind, "generation kind")?;
        let status: AttemptStatus = parse_enum(&row.status, "attempt status")?;
        Ok(GenerationAttempt {
            id: row.id,
            story_id: row.story_id,
            kind,
            status,
            error_message: row.error_message,
            started_at: row.started_at,
            finished_at: row.finished_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story_row(status: &str) -> StoryRow {
        StoryRow {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            character_sheet_id: None,
            title: "The Lantern".to_string(),
            prompt: "a fox finds a lantern".to_string(),
            child_name: "Mira".to_string(),
            child_age: 6,
            themes: vec!["adventure".to_string()],
            art_style: "watercolor".to_string(),
            page_count: 3,
            reading_level: "early".to_string(),
            language: "en".to_string(),
            status: status.to_string(),
            like_count: 0,
            document_key: None,
            failure_summary: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn story_row_converts() {
        let story: Story = story_row("generating").try_into().unwrap();
        assert_eq!(story.status, StoryStatus::Generating);
    }

    #[test]
    fn unknown_status_is_invalid_value() {
        let err = Story::try_from(story_row("exploded")).unwrap_err();
        assert!(format!("{}", err).contains("story status"));
    }

    #[test]
    fn empty_image_ref_maps_to_missing() {
        let row = StoryPageRow {
            id: Uuid::new_v4(),
            story_id: Uuid::new_v4(),
            page_number: 1,
            kind: "story".to_string(),
            content: "text".to_string(),
            image_ref: Some(String::new()),
            image_prompt: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let page: StoryPage = row.try_into().unwrap();
        assert!(page.missing_image());
    }

    #[test]
    fn stored_key_image_ref_parses() {
        let row = StoryPageRow {
            id: Uuid::new_v4(),
            story_id: Uuid::new_v4(),
            page_number: 2,
            kind: "story".to_string(),
            content: "text".to_string(),
            image_ref: Some("stories/x/pages/page-02.png".to_string()),
            image_prompt: Some("prompt".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let page: StoryPage = row.try_into().unwrap();
        assert_eq!(
            page.image,
            Some(ImageSource::Stored("stories/x/pages/page-02.png".to_string()))
        );
    }
}
