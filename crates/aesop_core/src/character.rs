//! Character sheet type.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reusable descriptor of a child's visual likeness, created once from a
/// user-submitted photo and referenced by zero or more stories.
///
/// Deleting a story does not delete its character sheet; sheets have an
/// independent lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSheet {
    /// Unique identifier
    pub id: Uuid,
    /// Owning user
    pub owner_id: Uuid,
    /// Hair color, e.g. "chestnut brown"
    pub hair_color: String,
    /// Hair style, e.g. "short curly"
    pub hair_style: String,
    /// Eye color
    pub eye_color: String,
    /// Skin tone
    pub skin_tone: String,
    /// Typical outfit
    pub outfit: String,
    /// Signature accessory, e.g. "red glasses"
    pub accessory: String,
    /// Distinctive features, e.g. "freckles across the nose"
    pub distinctive_features: String,
    /// URL of the reference image the sheet was derived from
    pub reference_image_url: Option<String>,
    /// Like counter
    pub like_count: i32,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
}
