//! Shared sync types and constants.

/// Account media edge walked by a bulk sync.
pub const MEDIA_PATH: &str = "me/media";

/// Author recorded on comments relayed from this system.
pub const LOCAL_AUTHOR: &str = "me";

/// Maximum length of a relayed comment.
pub const COMMENT_MAX_LEN: usize = 1000;

/// Result of a bulk sync.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
    /// Number of posts upserted.
    pub posts: usize,
    /// Number of comments upserted across all posts.
    pub comments: usize,
    /// Number of malformed posts and comments skipped.
    pub skipped: usize,
}
