use std::sync::Arc;

use crate::commands::shared::build_service;
use crate::config::Config;
use crate::progress::ProgressReporter;

pub(crate) async fn handle_comment(
    config: &Config,
    database_url: &str,
    post_id: i32,
    text: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = build_service(config, database_url).await?;

    let reporter = Arc::new(ProgressReporter::new());
    let callback = reporter.as_callback();

    let result = service
        .add_comment_with_progress(post_id, text, Some(&*callback))
        .await;
    reporter.finish();

    let comment = result?;
    println!(
        "Comment {} posted as {} (local id {}).",
        comment.ig_id, comment.username, comment.id
    );
    Ok(())
}
