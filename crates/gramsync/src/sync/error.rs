//! Error types for sync and comment relay.

use sea_orm::DbErr;
use thiserror::Error;

use crate::instagram::InstagramError;
use crate::store::StoreError;

/// Errors returned by [`InstagramService`](super::InstagramService).
///
/// `Transport` and `Database` are fatal for the running operation. `NotFound`
/// and `Validation` describe a bad request and are meant to be shown to the
/// caller as such.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Graph API failure while reading.
    #[error("Instagram request failed: {0}")]
    Transport(#[from] InstagramError),

    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// A local record the operation needs does not exist.
    #[error("Not found: {context}")]
    NotFound { context: String },

    /// The request was rejected, locally or by Instagram.
    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl SyncError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// NotFound for a local post key.
    pub fn post_not_found(post_id: i32) -> Self {
        Self::NotFound {
            context: format!("post with id {} does not exist in the local database", post_id),
        }
    }

    /// HTTP status an outer request layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Transport(_) => 502,
            Self::Database(_) => 500,
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => SyncError::Database(e),
            StoreError::NotFound { context } => SyncError::NotFound { context },
            StoreError::InvalidInput { message } => SyncError::Validation { message },
        }
    }
}
