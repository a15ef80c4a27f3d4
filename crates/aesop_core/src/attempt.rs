//! Generation attempt tracking types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a generation run produced.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GenerationKind {
    /// Per-page illustration generation
    Illustrations,
}

/// Status of one orchestration run.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttemptStatus {
    /// Recorded but not yet started
    Pending,
    /// Run is underway
    InProgress,
    /// Run finished with every page illustrated
    Completed,
    /// Run finished with at least one page missing
    Failed,
}

/// One end-to-end attempt to generate content for a story, including its
/// internal retry rounds. Used for user-facing error surfacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationAttempt {
    /// Unique identifier
    pub id: Uuid,
    /// Parent story
    pub story_id: Uuid,
    /// What this run generated
    pub kind: GenerationKind,
    /// Current status
    pub status: AttemptStatus,
    /// Human-readable error, populated when the run fails
    pub error_message: Option<String>,
    /// When the run was recorded
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// When the run finished, if it has
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
}
