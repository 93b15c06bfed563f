//! Store Errors
//!
//! Error types for entity store operations.

/// Errors that can occur in the entity store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A staged change no longer matches the stored state
    /// (duplicate key, missing row, broken relation).
    #[error("Save conflict: {0}")]
    Conflict(String),

    /// The unit of work was cancelled before it committed
    #[error("Operation cancelled")]
    Cancelled,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be decoded
    #[error("Invalid row data: {0}")]
    InvalidRow(String),

    /// The store refused the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Check if this error is a save conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Conflict(_) | StoreError::Database(_) | StoreError::Unavailable(_)
        )
    }

    /// Classify a database error, turning constraint violations into conflicts
    pub(crate) fn from_database(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            // 23505 unique_violation, 23503 foreign_key_violation
            if let Some(code) = db_err.code() {
                if code == "23505" || code == "23503" {
                    return StoreError::Conflict(db_err.message().to_string());
                }
            }
        }
        StoreError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_is_retryable() {
        let conflict = StoreError::Conflict("duplicate key".to_string());
        assert!(conflict.is_retryable());
        assert!(conflict.is_conflict());

        assert!(!StoreError::Cancelled.is_retryable());
        assert!(!StoreError::InvalidRow("bad role".to_string()).is_retryable());
    }

    #[test]
    fn test_non_database_error_is_not_conflict() {
        let err = StoreError::from_database(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
    }
}
