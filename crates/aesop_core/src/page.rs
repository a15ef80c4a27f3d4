//! Story page types and image reference handling.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a page's illustration is sourced from.
///
/// Pages persist a single textual reference; [`ImageSource::parse`]
/// classifies it back into a variant, matching the data shapes produced by
/// the generation pipeline (storage keys), user imports (remote URLs), and
/// legacy inline payloads (data URLs or bare base64).
///
/// # Examples
///
/// ```
/// use aesop_core::ImageSource;
///
/// let stored = ImageSource::parse("stories/abc/pages/page-01.png");
/// assert!(matches!(stored, ImageSource::Stored(_)));
///
/// let url = ImageSource::parse("https://example.com/cat.png");
/// assert!(matches!(url, ImageSource::Url(_)));
///
/// let inline = ImageSource::parse("data:image/png;base64,iVBORw0KGgo=");
/// assert!(matches!(inline, ImageSource::Base64(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ImageSource {
    /// Base64-encoded raster, with or without a `data:` URL prefix
    Base64(String),
    /// Remote HTTP(S) URL
    Url(String),
    /// Key into the object store
    Stored(String),
}

impl ImageSource {
    /// Classify a stored reference string.
    pub fn parse(reference: &str) -> ImageSource {
        if reference.starts_with("data:") {
            ImageSource::Base64(reference.to_string())
        } else if reference.starts_with("http://") || reference.starts_with("https://") {
            ImageSource::Url(reference.to_string())
        } else if looks_like_base64_payload(reference) {
            ImageSource::Base64(reference.to_string())
        } else {
            ImageSource::Stored(reference.to_string())
        }
    }

    /// The textual form persisted in the page row.
    pub fn as_ref_str(&self) -> &str {
        match self {
            ImageSource::Base64(s) | ImageSource::Url(s) | ImageSource::Stored(s) => s,
        }
    }

    /// Strip any `data:<mime>;base64,` prefix from an inline payload.
    ///
    /// Returns the raw base64 text for [`ImageSource::Base64`]; `None` for
    /// other variants.
    pub fn base64_payload(&self) -> Option<&str> {
        match self {
            ImageSource::Base64(s) => Some(match s.split_once(";base64,") {
                Some((_, payload)) => payload,
                None => s.as_str(),
            }),
            _ => None,
        }
    }
}

/// Bare base64 payloads are long and drawn from a closed alphabet; storage
/// keys contain `/` and `.` which base64 never does.
fn looks_like_base64_payload(reference: &str) -> bool {
    reference.len() >= 64
        && reference
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
}

/// Kind of page within a story.
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
pub enum PageKind {
    /// Cover page
    Cover,
    /// Regular story page
    Story,
}

/// One page of a story: text plus an optional illustration reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryPage {
    /// Unique identifier
    pub id: Uuid,
    /// Parent story
    pub story_id: Uuid,
    /// 1-based position, unique per story
    pub page_number: i32,
    /// Cover or story page
    pub kind: PageKind,
    /// Body text shown on the page; doubles as the scene description for
    /// illustration prompts
    pub content: String,
    /// Illustration reference, empty until generation succeeds
    pub image: Option<ImageSource>,
    /// The exact prompt used for the successful generation, if any
    pub image_prompt: Option<String>,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Last update timestamp
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl StoryPage {
    /// Whether this page still needs an illustration.
    pub fn missing_image(&self) -> bool {
        match &self.image {
            None => true,
            Some(source) => source.as_ref_str().is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_classifies_storage_keys() {
        let source = ImageSource::parse("stories/abc/pages/page-01-r0-17.png");
        assert_eq!(
            source,
            ImageSource::Stored("stories/abc/pages/page-01-r0-17.png".to_string())
        );
    }

    #[test]
    fn parse_classifies_bare_base64() {
        let payload = "A".repeat(80);
        assert!(matches!(ImageSource::parse(&payload), ImageSource::Base64(_)));
    }

    #[test]
    fn base64_payload_strips_data_url_prefix() {
        let source = ImageSource::Base64("data:image/webp;base64,UklGRg==".to_string());
        assert_eq!(source.base64_payload(), Some("UklGRg=="));

        let bare = ImageSource::Base64("UklGRg==".to_string());
        assert_eq!(bare.base64_payload(), Some("UklGRg=="));
    }
}
