//! Document assembly error types.

/// Kinds of document assembly errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum DocumentErrorKind {
    /// Remote image fetch failed
    #[display("Image fetch failed: {}", _0)]
    Fetch(String),
    /// Image payload exceeded the configured byte ceiling
    #[display("Image too large: {} bytes exceeds limit of {} bytes", actual, limit)]
    ImageTooLarge {
        /// Observed payload size in bytes
        actual: usize,
        /// Configured ceiling in bytes
        limit: usize,
    },
    /// Inline base64 payload could not be decoded
    #[display("Base64 decode error: {}", _0)]
    Base64Decode(String),
    /// Raster payload could not be decoded into pixels
    #[display("Image decode error: {}", _0)]
    ImageDecode(String),
    /// Raster format is not supported for embedding
    #[display("Unsupported image format: {}", _0)]
    UnsupportedFormat(String),
    /// Format conversion (e.g. WebP to PNG) failed
    #[display("Image conversion failed: {}", _0)]
    Conversion(String),
    /// PDF serialization failed
    #[display("Failed to write PDF: {}", _0)]
    PdfWrite(String),
}

/// Document assembly error with location tracking.
///
/// # Examples
///
/// ```
/// use aesop_error::{DocumentError, DocumentErrorKind};
///
/// let err = DocumentError::new(DocumentErrorKind::UnsupportedFormat("image/tiff".to_string()));
/// assert!(format!("{}", err).contains("Unsupported"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Document Error: {} at line {} in {}", kind, line, file)]
pub struct DocumentError {
    /// The kind of error that occurred
    pub kind: DocumentErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl DocumentError {
    /// Create a new DocumentError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DocumentErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
