//! Pipeline orchestration error types.

/// Specific error conditions for the illustration pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PipelineErrorKind {
    /// Character sheet referenced by the story could not be found
    #[display("Character sheet not found: {}", _0)]
    CharacterNotFound(String),
    /// Story has no pages to illustrate
    #[display("Story {} has no pages", _0)]
    NoPages(String),
    /// Requested status change violates the story state machine
    #[display("Invalid status transition from '{}' to '{}'", from, to)]
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },
}

/// Pipeline error with location tracking.
///
/// # Examples
///
/// ```
/// use aesop_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::InvalidTransition {
///     from: "completed".to_string(),
///     to: "generating".to_string(),
/// });
/// assert!(format!("{}", err).contains("Invalid status transition"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The kind of error that occurred
    pub kind: PipelineErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
