//! Database connection pooling.

use crate::DatabaseResult;
use aesop_error::{DatabaseError, DatabaseErrorKind};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

/// Shared r2d2 connection pool over Postgres.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Build a connection pool for the given database URL.
///
/// The URL arrives explicitly from configuration; this crate never reads the
/// process environment.
///
/// # Errors
///
/// Returns an error if the pool cannot be initialized (unreachable host,
/// bad credentials).
pub fn establish_pool(database_url: &str) -> DatabaseResult<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .build(manager)
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))
}
