//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)      CoreError (pricing, validation)       │
//! │       │                               │                                 │
//! │       ▼                               ▼                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in apps/api) ← HTTP status + JSON body                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use tienda_core::CoreError;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - Retrieve, update or delete of an id that doesn't exist
    /// - A transaction references a client or product that doesn't exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate client document or email
    /// - Duplicate caller-supplied product id
    #[error("{field} already exists")]
    UniqueViolation { field: String },

    /// Delete refused because transactions still reference the record.
    ///
    /// ## When This Occurs
    /// - Deleting a client who has transactions
    /// - Deleting a product that appears in a transaction line
    #[error("{entity} {id} is referenced by existing transactions")]
    Referenced { entity: String, id: String },

    /// Foreign key constraint violation outside of a guarded delete.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A domain rule rejected the data being persisted.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Turns a foreign key failure raised by a delete into `Referenced`.
    pub(crate) fn on_delete_of(self, entity: &str, id: &str) -> Self {
        match self {
            DbError::ForeignKeyViolation { .. } => DbError::Referenced {
                entity: entity.to_string(),
                id: id.to_string(),
            },
            other => other,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // UNIQUE:      "UNIQUE constraint failed: <table>.<column>"
                // FOREIGN KEY: "FOREIGN KEY constraint failed"
                if let Some(target) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: unique_column(target),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Extracts the column from `table.column` (first column for composite keys).
fn unique_column(target: &str) -> String {
    let first = target.split(',').next().unwrap_or(target).trim();
    first
        .rsplit_once('.')
        .map(|(_, column)| column)
        .unwrap_or(first)
        .to_string()
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_column_parsing() {
        assert_eq!(unique_column("clients.email"), "email");
        assert_eq!(unique_column("clients.document"), "document");
        assert_eq!(unique_column("a.x, a.y"), "x");
        assert_eq!(unique_column("weird"), "weird");
    }

    #[test]
    fn test_on_delete_of_only_rewrites_fk_failures() {
        let fk = DbError::ForeignKeyViolation {
            message: "FOREIGN KEY constraint failed".to_string(),
        };
        assert!(matches!(fk.on_delete_of("Product", "P1"), DbError::Referenced { .. }));

        let nf = DbError::not_found("Product", "P1");
        assert!(matches!(nf.on_delete_of("Product", "P1"), DbError::NotFound { .. }));
    }

    #[test]
    fn test_messages() {
        let err = DbError::UniqueViolation {
            field: "email".to_string(),
        };
        assert_eq!(err.to_string(), "email already exists");

        let err = DbError::Referenced {
            entity: "Client".to_string(),
            id: "123".to_string(),
        };
        assert_eq!(err.to_string(), "Client 123 is referenced by existing transactions");
    }
}
