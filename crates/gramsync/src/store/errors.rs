use sea_orm::DbErr;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Record not found.
    #[error("Record not found: {context}")]
    NotFound { context: String },

    /// Invalid input data.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl StoreError {
    /// Create a NotFound error for a local primary key lookup.
    pub fn not_found_by_id(entity: &str, id: i32) -> Self {
        Self::NotFound {
            context: format!("{} id={}", entity, id),
        }
    }

    /// Create a NotFound error for a remote identifier lookup.
    pub fn not_found_by_ig_id(entity: &str, ig_id: &str) -> Self {
        Self::NotFound {
            context: format!("{} ig_id={}", entity, ig_id),
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
