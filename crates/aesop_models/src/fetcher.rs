//! Bounded HTTP download of remote illustrations.

use aesop_core::DocumentConfig;
use aesop_error::{AesopResult, DocumentError, DocumentErrorKind};
use aesop_interface::ImageFetcher;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Fetches remote illustration URLs under a short timeout and a byte
/// ceiling, for use by the document assembler.
///
/// Failures here are always downgraded to a placeholder by the assembler;
/// the ceiling exists so one oversized image cannot blow the assembler's
/// memory or latency budget.
#[derive(Debug)]
pub struct HttpImageFetcher {
    http: reqwest::Client,
    max_bytes: usize,
}

impl HttpImageFetcher {
    /// Create a fetcher from the document configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &DocumentConfig) -> AesopResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .build()
            .map_err(|e| DocumentError::new(DocumentErrorKind::Fetch(e.to_string())))?;

        Ok(Self {
            http,
            max_bytes: config.max_image_bytes,
        })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &str) -> AesopResult<Vec<u8>> {
        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| DocumentError::new(DocumentErrorKind::Fetch(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocumentError::new(DocumentErrorKind::Fetch(format!(
                "HTTP {} from {}",
                status.as_u16(),
                url
            )))
            .into());
        }

        // Reject declared-oversized payloads before reading the body.
        if let Some(length) = response.content_length() {
            if length as usize > self.max_bytes {
                return Err(DocumentError::new(DocumentErrorKind::ImageTooLarge {
                    actual: length as usize,
                    limit: self.max_bytes,
                })
                .into());
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| DocumentError::new(DocumentErrorKind::Fetch(e.to_string())))?
        {
            bytes.extend_from_slice(&chunk);
            if bytes.len() > self.max_bytes {
                return Err(DocumentError::new(DocumentErrorKind::ImageTooLarge {
                    actual: bytes.len(),
                    limit: self.max_bytes,
                })
                .into());
            }
        }

        debug!(size = bytes.len(), "Fetched remote illustration");
        Ok(bytes)
    }
}
