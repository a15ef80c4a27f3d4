//! Story record type.

use crate::StoryStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A generated illustrated narrative, composed of ordered pages.
///
/// Status transitions are driven exclusively by the illustration
/// orchestrator; see [`StoryStatus`] for the legal state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Unique identifier
    pub id: Uuid,
    /// Owning user
    pub owner_id: Uuid,
    /// Optional character sheet referenced (not owned) by this story
    pub character_sheet_id: Option<Uuid>,
    /// Display title
    pub title: String,
    /// Free-text premise the story was generated from
    pub prompt: String,
    /// Name of the child the story stars
    pub child_name: String,
    /// Age of the child, used to pitch vocabulary
    pub child_age: i32,
    /// Theme tags (adventure, friendship, ...)
    pub themes: Vec<String>,
    /// Illustration art style label (watercolor, cartoon, ...)
    pub art_style: String,
    /// Number of story pages requested by the wizard
    pub page_count: i32,
    /// Reading level label
    pub reading_level: String,
    /// ISO language code of the story text
    pub language: String,
    /// Lifecycle status
    pub status: StoryStatus,
    /// Like counter
    pub like_count: i32,
    /// Object-store key of the exported PDF, once generated
    pub document_key: Option<String>,
    /// Human-readable summary of the last failed generation run
    pub failure_summary: Option<String>,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Last update timestamp
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Story {
    /// Subtitle line used on the storybook cover.
    pub fn cover_subtitle(&self) -> String {
        format!("A story for {}", self.child_name)
    }
}
