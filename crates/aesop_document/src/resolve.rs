//! Illustration resolution: reference → raw RGB pixels.
//!
//! Page image references arrive in three encodings (object-store keys,
//! remote URLs, inline base64 with or without a data-URL prefix). All three
//! funnel through [`decode_raster`], which normalizes WebP payloads to PNG
//! first because the PDF layer embeds PNG/JPEG-class rasters, not WebP.

use aesop_core::{DocumentConfig, ImageSource};
use aesop_error::{AesopResult, DocumentError, DocumentErrorKind};
use aesop_interface::{ImageFetcher, MediaStore};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use std::io::Cursor;
use tracing::debug;

/// A decoded illustration ready for embedding.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Raw 8-bit RGB pixel data, row-major
    pub rgb: Vec<u8>,
}

/// Resolve a page's image reference into pixels.
///
/// Stored keys load from the object store; URLs download through the
/// bounded fetcher; inline base64 decodes directly. The byte ceiling
/// applies to every path.
///
/// # Errors
///
/// Any failure (missing object, network error, oversized payload, decode
/// failure) returns a `DocumentError` the assembler downgrades to a
/// placeholder.
pub async fn resolve_image<F, S>(
    source: &ImageSource,
    fetcher: &F,
    store: &S,
    config: &DocumentConfig,
) -> AesopResult<ResolvedImage>
where
    F: ImageFetcher + ?Sized,
    S: MediaStore + ?Sized,
{
    let bytes = match source {
        ImageSource::Stored(key) => store.get(key).await?,
        ImageSource::Url(url) => fetcher.fetch(url).await?,
        ImageSource::Base64(_) => {
            let payload = source.base64_payload().unwrap_or("");
            STANDARD.decode(payload.trim()).map_err(|e| {
                DocumentError::new(DocumentErrorKind::Base64Decode(e.to_string()))
            })?
        }
    };

    if bytes.len() > config.max_image_bytes {
        return Err(DocumentError::new(DocumentErrorKind::ImageTooLarge {
            actual: bytes.len(),
            limit: config.max_image_bytes,
        })
        .into());
    }

    Ok(decode_raster(&bytes)?)
}

/// Decode raster bytes to RGB pixels, converting WebP to PNG first.
///
/// # Errors
///
/// Returns an error when the format cannot be recognized or decoded.
pub fn decode_raster(bytes: &[u8]) -> Result<ResolvedImage, DocumentError> {
    let format = image::guess_format(bytes)
        .map_err(|e| DocumentError::new(DocumentErrorKind::UnsupportedFormat(e.to_string())))?;

    let converted;
    let bytes = if format == ImageFormat::WebP {
        converted = convert_webp_to_png(bytes)?;
        debug!(
            webp_len = bytes.len(),
            png_len = converted.len(),
            "Converted WebP payload to PNG"
        );
        converted.as_slice()
    } else {
        bytes
    };

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| DocumentError::new(DocumentErrorKind::ImageDecode(e.to_string())))?;
    let rgb = decoded.to_rgb8();

    Ok(ResolvedImage {
        width: rgb.width(),
        height: rgb.height(),
        rgb: rgb.into_raw(),
    })
}

/// Re-encode a WebP payload as PNG.
///
/// # Errors
///
/// Returns an error when the payload is not decodable WebP or the PNG
/// encoder fails.
pub fn convert_webp_to_png(bytes: &[u8]) -> Result<Vec<u8>, DocumentError> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::WebP)
        .map_err(|e| DocumentError::new(DocumentErrorKind::Conversion(e.to_string())))?;

    let mut out = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| DocumentError::new(DocumentErrorKind::Conversion(e.to_string())))?;
    Ok(out)
}
