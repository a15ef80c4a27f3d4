//! Image-generation error types and retry classification.

/// Specific error conditions for image-generation API calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ImageGenErrorKind {
    /// API key missing from the client configuration
    #[display("Image API key is not configured")]
    MissingApiKey,
    /// Request could not be built or sent
    #[display("Image API request failed: {}", _0)]
    Transport(String),
    /// Request exceeded its deadline
    #[display("Image API request timed out: {}", _0)]
    Timeout(String),
    /// HTTP error with status code and message
    #[display("HTTP {} error: {}", status_code, message)]
    HttpError {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// The provider refused the request on rate-limit grounds (HTTP 429)
    #[display("Rate limited by image API: {}", _0)]
    RateLimited(String),
    /// The provider rejected the prompt for content-policy reasons
    #[display("Content policy rejection: {}", _0)]
    ContentPolicy(String),
    /// Response body could not be parsed
    #[display("Unexpected image API response: {}", _0)]
    InvalidResponse(String),
    /// Response contained no image payload
    #[display("Image API returned an empty response")]
    EmptyResponse,
    /// Returned base64 payload could not be decoded
    #[display("Base64 decode error: {}", _0)]
    Base64Decode(String),
}

impl ImageGenErrorKind {
    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ImageGenErrorKind::HttpError { status_code, .. } => {
                matches!(*status_code, 408 | 429 | 500 | 502 | 503 | 504)
            }
            ImageGenErrorKind::RateLimited(_) => true,
            ImageGenErrorKind::Transport(_) => true,
            ImageGenErrorKind::Timeout(_) => true,
            // Retryable, but the caller is expected to soften the prompt first.
            ImageGenErrorKind::ContentPolicy(_) => true,
            _ => false,
        }
    }

    /// Get retry strategy parameters for this error type.
    ///
    /// Returns `(initial_backoff_ms, max_retries, max_delay_secs)`.
    pub fn retry_strategy_params(&self) -> (u64, usize, u64) {
        match self {
            ImageGenErrorKind::RateLimited(_) => (5000, 3, 40),
            ImageGenErrorKind::HttpError { status_code, .. } => match *status_code {
                429 => (5000, 3, 40),
                503 => (2000, 5, 60),
                500 | 502 | 504 => (1000, 3, 8),
                408 => (2000, 4, 30),
                _ => (2000, 5, 60),
            },
            ImageGenErrorKind::Transport(_) => (500, 2, 8),
            ImageGenErrorKind::Timeout(_) => (1000, 2, 10),
            _ => (2000, 5, 60),
        }
    }
}

/// Image-generation error with source location tracking.
///
/// # Examples
///
/// ```
/// use aesop_error::{ImageGenError, ImageGenErrorKind};
///
/// let err = ImageGenError::new(ImageGenErrorKind::RateLimited("slow down".to_string()));
/// assert!(format!("{}", err).contains("Rate limited"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Image Generation Error: {} at line {} in {}", kind, line, file)]
pub struct ImageGenError {
    /// The kind of error that occurred
    pub kind: ImageGenErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ImageGenError {
    /// Create a new ImageGenError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ImageGenErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Trait for errors that support retry logic.
///
/// This trait allows error types to specify whether they should trigger a
/// retry and what retry strategy parameters to use.
///
/// # Examples
///
/// ```
/// use aesop_error::{ImageGenError, ImageGenErrorKind, RetryableError};
///
/// let err = ImageGenError::new(ImageGenErrorKind::HttpError {
///     status_code: 503,
///     message: "Service unavailable".to_string(),
/// });
///
/// assert!(err.is_retryable());
/// let (backoff, retries, _max_delay) = err.retry_strategy_params();
/// assert_eq!(backoff, 2000);
/// assert_eq!(retries, 5);
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    ///
    /// Transient errors like 503 (service unavailable), 429 (rate limit),
    /// or network timeouts should return true. Permanent errors like 401
    /// (unauthorized) or 400 (bad request) should return false.
    fn is_retryable(&self) -> bool;

    /// Get retry strategy parameters for this error.
    ///
    /// Returns `(initial_backoff_ms, max_retries, max_delay_secs)`.
    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        (2000, 5, 60)
    }
}

impl RetryableError for ImageGenError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        self.kind.retry_strategy_params()
    }
}
