//! Request and response types for image-generation APIs.

use aesop_error::{ImageGenError, ImageGenErrorKind};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Output resolution for generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ImageSize {
    /// 1024x1024 square
    #[default]
    #[serde(rename = "1024x1024")]
    Square1024,
    /// 1024x1792 portrait
    #[serde(rename = "1024x1792")]
    Portrait1024x1792,
    /// 1792x1024 landscape
    #[serde(rename = "1792x1024")]
    Landscape1792x1024,
}

impl ImageSize {
    /// Wire representation expected by the image API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Square1024 => "1024x1024",
            ImageSize::Portrait1024x1792 => "1024x1792",
            ImageSize::Landscape1792x1024 => "1792x1024",
        }
    }
}

/// Rendering quality tier for generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    /// Standard quality
    #[default]
    Standard,
    /// High detail
    Hd,
}

impl ImageQuality {
    /// Wire representation expected by the image API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageQuality::Standard => "standard",
            ImageQuality::Hd => "hd",
        }
    }
}

/// One image-generation request.
///
/// `size` and `quality` fall back to the client configuration when unset.
///
/// # Examples
///
/// ```
/// use aesop_core::ImageRequest;
///
/// let request = ImageRequest::new("A watercolor fox reading a book");
/// assert!(request.size.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ImageRequest {
    /// The full illustration prompt
    pub prompt: String,
    /// Requested resolution, `None` for the client default
    pub size: Option<ImageSize>,
    /// Requested quality tier, `None` for the client default
    pub quality: Option<ImageQuality>,
}

impl ImageRequest {
    /// Create a request with default size and quality.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            size: None,
            quality: None,
        }
    }
}

/// A successfully generated image, still in its base64 wire encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Base64-encoded raster payload
    pub b64_json: String,
    /// MIME type reported or assumed for the payload
    pub mime: String,
}

impl GeneratedImage {
    /// Decode the base64 payload into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `ImageGenErrorKind::Base64Decode` when the payload is not
    /// valid base64.
    pub fn decode(&self) -> Result<Vec<u8>, ImageGenError> {
        STANDARD
            .decode(&self.b64_json)
            .map_err(|e| ImageGenError::new(ImageGenErrorKind::Base64Decode(e.to_string())))
    }
}
