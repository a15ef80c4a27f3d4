//! Database error types.

use crate::RetryableError;

/// Kinds of database errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum DatabaseErrorKind {
    /// Failed to connect to the database
    #[display("Database connection failed: {}", _0)]
    Connection(String),
    /// Failed to check out a pooled connection
    #[display("Connection pool error: {}", _0)]
    Pool(String),
    /// Query execution failed
    #[display("Query failed: {}", _0)]
    Query(String),
    /// Expected row was not found
    #[display("Record not found: {}", _0)]
    NotFound(String),
    /// Stored value could not be converted to a domain type
    #[display("Invalid stored value: {}", _0)]
    InvalidValue(String),
}

/// Database error with location tracking.
///
/// # Examples
///
/// ```
/// use aesop_error::{DatabaseError, DatabaseErrorKind};
///
/// let err = DatabaseError::new(DatabaseErrorKind::NotFound("stories".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Database Error: {} at line {} in {}", kind, line, file)]
pub struct DatabaseError {
    /// The kind of error that occurred
    pub kind: DatabaseErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl DatabaseError {
    /// Create a new DatabaseError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DatabaseErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl RetryableError for DatabaseError {
    fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            DatabaseErrorKind::Connection(_) | DatabaseErrorKind::Pool(_)
        )
    }

    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        (250, 3, 5)
    }
}

impl From<diesel::result::Error> for DatabaseError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => {
                DatabaseError::new(DatabaseErrorKind::NotFound(err.to_string()))
            }
            other => DatabaseError::new(DatabaseErrorKind::Query(other.to_string())),
        }
    }
}
