use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation: {message}")]
    UniqueViolation {
        /// Table parsed from the SQLite error detail, when present
        table: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Check constraint violation
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DbError {
    /// Whether a unique violation involves the given `table.column` pair.
    ///
    /// SQLite reports violated columns in the error message
    /// ("UNIQUE constraint failed: applications.driver_id, ..."), so handlers
    /// match on the qualified column name to recognize which invariant fired.
    pub fn unique_violation_on(&self, qualified_column: &str) -> bool {
        match self {
            DbError::UniqueViolation { message, .. } => message.contains(qualified_column),
            _ => false,
        }
    }
}

/// Convert from sqlx::Error using proper sqlx error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    let message = db_err.message().to_string();
                    DbError::UniqueViolation {
                        table: extract_table(&message),
                        message,
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        message: db_err.message().to_string(),
                    }
                } else {
                    // All other database errors are non-recoverable - convert to anyhow
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            // All other sqlx errors are non-recoverable - convert to anyhow with context
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Extract the table name from a SQLite constraint message like
/// "UNIQUE constraint failed: applications.driver_id, applications.campaign_id"
fn extract_table(message: &str) -> Option<String> {
    let detail = message.split(':').nth(1)?.trim();
    let first_column = detail.split(',').next()?.trim();
    first_column.split('.').next().map(|t| t.to_string())
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
