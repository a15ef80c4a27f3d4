//! Top-level error wrapper types.

#[cfg(feature = "database")]
use crate::DatabaseError;
use crate::{ConfigError, DocumentError, ImageGenError, PipelineError, StorageError};

/// This is the foundation error enum. Each Aesop crate contributes the
/// variant covering its own failure domain.
///
/// # Examples
///
/// ```
/// use aesop_error::{AesopError, ConfigError};
///
/// let config_err = ConfigError::new("missing api key");
/// let err: AesopError = config_err.into();
/// assert!(format!("{}", err).contains("Config Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum AesopErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Object storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Image-generation API error
    #[from(ImageGenError)]
    ImageGen(ImageGenError),
    /// Document assembly error
    #[from(DocumentError)]
    Document(DocumentError),
    /// Pipeline orchestration error
    #[from(PipelineError)]
    Pipeline(PipelineError),
    /// Database error
    #[cfg(feature = "database")]
    #[from(DatabaseError)]
    Database(DatabaseError),
}

/// Aesop error with kind discrimination.
///
/// # Examples
///
/// ```
/// use aesop_error::{AesopResult, ConfigError};
///
/// fn might_fail() -> AesopResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Aesop Error: {}", _0)]
pub struct AesopError(Box<AesopErrorKind>);

impl AesopError {
    /// Create a new error from a kind.
    pub fn new(kind: AesopErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &AesopErrorKind {
        &self.0
    }

    /// Whether this error is transient and worth retrying.
    ///
    /// Used by callers that retry across subsystem boundaries (e.g. the
    /// orchestrator's bounded page-row update retry) without matching on
    /// feature-gated variants themselves.
    pub fn is_transient(&self) -> bool {
        use crate::RetryableError;
        match self.kind() {
            AesopErrorKind::Storage(e) => {
                matches!(e.kind, crate::StorageErrorKind::Unavailable(_))
            }
            AesopErrorKind::ImageGen(e) => e.is_retryable(),
            #[cfg(feature = "database")]
            AesopErrorKind::Database(e) => e.is_retryable(),
            _ => false,
        }
    }
}

// Generic From implementation for any type that converts to AesopErrorKind
impl<T> From<T> for AesopError
where
    T: Into<AesopErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Aesop operations.
///
/// # Examples
///
/// ```
/// use aesop_error::{AesopResult, StorageError, StorageErrorKind};
///
/// fn read_object() -> AesopResult<Vec<u8>> {
///     Err(StorageError::new(StorageErrorKind::NotFound("key".to_string())))?
/// }
/// ```
pub type AesopResult<T> = std::result::Result<T, AesopError>;
