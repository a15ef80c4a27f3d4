//! Illustration prompt assembly.

use crate::{SafetyTier, sanitize_scene};
use aesop_core::CharacterSheet;

/// Build the full text prompt for one page's illustration.
///
/// Concatenates a style preamble, the sanitized scene description, and,
/// when a character sheet is present, an enumerated physical-consistency
/// block with an explicit instruction to keep the character identical
/// across pages.
///
/// Pure function: deterministic for identical inputs, no I/O, no error
/// conditions.
///
/// # Examples
///
/// ```
/// use aesop_prompt::{SafetyTier, illustration_prompt};
///
/// let prompt = illustration_prompt(
///     "A fox finds a lantern in the dark woods",
///     None,
///     "watercolor",
///     SafetyTier::Normal,
/// );
/// assert!(prompt.contains("watercolor"));
/// assert!(prompt.contains("mysterious woods"));
/// assert!(!prompt.contains("dark woods"));
/// ```
pub fn illustration_prompt(
    scene: &str,
    character: Option<&CharacterSheet>,
    art_style: &str,
    tier: SafetyTier,
) -> String {
    let mut prompt = format!(
        "A {} children's book illustration, warm and friendly, suitable for young readers. Scene: {}",
        art_style,
        sanitize_scene(scene, tier),
    );

    if let Some(sheet) = character {
        prompt.push_str("\n\nThe main character appears in this scene and must look exactly the same as on every other page:");
        prompt.push_str(&format!("\n- hair: {} {}", sheet.hair_color, sheet.hair_style));
        prompt.push_str(&format!("\n- eyes: {}", sheet.eye_color));
        prompt.push_str(&format!("\n- skin: {}", sheet.skin_tone));
        prompt.push_str(&format!("\n- outfit: {}", sheet.outfit));
        prompt.push_str(&format!("\n- accessory: {}", sheet.accessory));
        prompt.push_str(&format!(
            "\n- distinctive features: {}",
            sheet.distinctive_features
        ));
        prompt.push_str("\nKeep these physical details consistent across all pages of the book.");
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sheet() -> CharacterSheet {
        CharacterSheet {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            hair_color: "chestnut brown".to_string(),
            hair_style: "short curly".to_string(),
            eye_color: "green".to_string(),
            skin_tone: "light tan".to_string(),
            outfit: "yellow raincoat".to_string(),
            accessory: "red glasses".to_string(),
            distinctive_features: "freckles across the nose".to_string(),
            reference_image_url: None,
            like_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let sheet = sheet();
        let a = illustration_prompt("A picnic by the lake", Some(&sheet), "cartoon", SafetyTier::Normal);
        let b = illustration_prompt("A picnic by the lake", Some(&sheet), "cartoon", SafetyTier::Normal);
        assert_eq!(a, b);
    }

    #[test]
    fn includes_character_block_when_present() {
        let prompt = illustration_prompt("A picnic", Some(&sheet()), "cartoon", SafetyTier::Normal);
        assert!(prompt.contains("chestnut brown short curly"));
        assert!(prompt.contains("red glasses"));
        assert!(prompt.contains("freckles across the nose"));
        assert!(prompt.contains("consistent across all pages"));
    }

    #[test]
    fn omits_character_block_when_absent() {
        let prompt = illustration_prompt("A picnic", None, "cartoon", SafetyTier::Normal);
        assert!(!prompt.contains("main character"));
    }

    #[test]
    fn conservative_tier_changes_output() {
        let normal = illustration_prompt("The monster appears", None, "cartoon", SafetyTier::Normal);
        let safer =
            illustration_prompt("The monster appears", None, "cartoon", SafetyTier::Conservative);
        assert!(normal.contains("monster"));
        assert!(safer.contains("friendly animal"));
    }
}
