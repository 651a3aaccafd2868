use gramsync::sync::SyncProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::FetchingPosts { page_size } => {
                tracing::info!(page_size, "Fetching posts");
            }

            SyncProgress::PostSynced {
                ig_id,
                comments,
                total_so_far,
            } => {
                tracing::debug!(ig_id = %ig_id, comments, total_so_far, "Post synced");
            }

            SyncProgress::ItemSkipped {
                kind,
                ig_id,
                reason,
            } => {
                tracing::warn!(
                    kind = %kind,
                    ig_id = ig_id.as_deref().unwrap_or("-"),
                    reason = %reason,
                    "Skipped malformed item"
                );
            }

            SyncProgress::SyncComplete {
                posts,
                comments,
                skipped,
            } => {
                tracing::info!(posts, comments, skipped, "Sync complete");
            }

            SyncProgress::SyncAborted { error } => {
                tracing::error!(error = %error, "Sync aborted, nothing committed");
            }

            SyncProgress::CommentRelayed {
                post_ig_id,
                comment_ig_id,
            } => {
                tracing::info!(post = %post_ig_id, comment = %comment_ig_id, "Comment posted");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
