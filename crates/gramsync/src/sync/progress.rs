//! Progress reporting types for sync operations.
//!
//! The sync service emits these events as it walks the account; the CLI
//! turns them into a spinner or structured log lines.

use std::fmt;

/// Kind of remote item being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Post,
    Comment,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Post => write!(f, "post"),
            ItemKind::Comment => write!(f, "comment"),
        }
    }
}

/// Progress events emitted during sync and comment relay.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// Starting to walk the account's media.
    FetchingPosts {
        /// Requested page size.
        page_size: u32,
    },

    /// A post and all of its comments were written (not yet committed).
    PostSynced {
        /// Instagram media ID.
        ig_id: String,
        /// Number of comments written for this post.
        comments: usize,
        /// Running count of posts written so far.
        total_so_far: usize,
    },

    /// A malformed item was skipped.
    ItemSkipped {
        kind: ItemKind,
        /// Remote ID, when the item had a usable one.
        ig_id: Option<String>,
        reason: String,
    },

    /// The sync transaction was committed.
    SyncComplete {
        posts: usize,
        comments: usize,
        skipped: usize,
    },

    /// The sync failed and every write was rolled back.
    SyncAborted {
        /// Error message.
        error: String,
    },

    /// A new comment was posted to Instagram and stored locally.
    CommentRelayed {
        /// Instagram media ID of the post.
        post_ig_id: String,
        /// Instagram ID of the new comment.
        comment_ig_id: String,
    },
}

/// Callback for progress updates during sync operations.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
///
/// # Example
///
/// ```ignore
/// use gramsync::sync::{emit, SyncProgress, ProgressCallback};
///
/// fn my_sync(on_progress: Option<&ProgressCallback>) {
///     emit(on_progress, SyncProgress::FetchingPosts { page_size: 50 });
/// }
/// ```
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
