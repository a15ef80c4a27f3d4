//! Scene description sanitization.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Degree of prompt sanitization applied before image generation.
///
/// The conservative tier exists for retries: after a content-policy
/// rejection the orchestrator rebuilds the prompt with stronger
/// substitutions.
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
pub enum SafetyTier {
    /// Standard substitution table
    Normal,
    /// Standard table plus stronger substitutions, for retry rounds
    Conservative,
}

/// Violence/fear/darkness terms replaced in every prompt.
const NORMAL_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("fighting", "playing"),
    ("fight", "adventure"),
    ("battle", "game"),
    ("attack", "surprise"),
    ("weapon", "magic wand"),
    ("sword", "wand"),
    ("blood", "paint"),
    ("kill", "catch"),
    ("dead", "sleeping"),
    ("death", "sleep"),
    ("scary", "surprising"),
    ("scared", "amazed"),
    ("afraid", "curious"),
    ("dark", "mysterious"),
    ("creepy", "curious"),
];

/// Additional substitutions applied only on the conservative tier.
const CONSERVATIVE_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("monster", "friendly animal"),
    ("monsters", "friendly animals"),
    ("fire", "sparkles"),
    ("flames", "sparkles"),
    ("storm", "rainbow"),
    ("ghost", "glowing friend"),
    ("witch", "kind wizard"),
    ("dragon", "dinosaur friend"),
    ("danger", "excitement"),
    ("dangerous", "exciting"),
    ("shadow", "glimmer"),
    ("roar", "cheer"),
];

static NORMAL_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> =
    LazyLock::new(|| compile(NORMAL_SUBSTITUTIONS));

static CONSERVATIVE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> =
    LazyLock::new(|| compile(CONSERVATIVE_SUBSTITUTIONS));

fn compile(table: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    table
        .iter()
        .map(|(term, replacement)| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(term));
            // The tables above are fixed word lists; the pattern is always valid.
            let re = Regex::new(&pattern).expect("substitution pattern compiles");
            (re, *replacement)
        })
        .collect()
}

/// Replace banned terms in a scene description with neutral synonyms.
///
/// Whole-word, case-insensitive. The conservative tier applies the normal
/// table first and then its larger table, so its output never contains a
/// term from either list.
///
/// # Examples
///
/// ```
/// use aesop_prompt::{SafetyTier, sanitize_scene};
///
/// let scene = sanitize_scene("A fight in the dark forest", SafetyTier::Normal);
/// assert_eq!(scene, "A adventure in the mysterious forest");
///
/// let scene = sanitize_scene("A monster breathing fire", SafetyTier::Conservative);
/// assert_eq!(scene, "A friendly animal breathing sparkles");
/// ```
pub fn sanitize_scene(description: &str, tier: SafetyTier) -> String {
    let mut result = description.to_string();
    for (re, replacement) in NORMAL_PATTERNS.iter() {
        result = re.replace_all(&result, *replacement).into_owned();
    }
    if tier == SafetyTier::Conservative {
        for (re, replacement) in CONSERVATIVE_PATTERNS.iter() {
            result = re.replace_all(&result, *replacement).into_owned();
        }
    }
    result
}

/// The terms removed at the given tier, for coverage checks.
#[cfg(test)]
pub(crate) fn banned_terms(tier: SafetyTier) -> Vec<&'static str> {
    let mut terms: Vec<&'static str> = NORMAL_SUBSTITUTIONS.iter().map(|(t, _)| *t).collect();
    if tier == SafetyTier::Conservative {
        terms.extend(CONSERVATIVE_SUBSTITUTIONS.iter().map(|(t, _)| *t));
    }
    terms
}
