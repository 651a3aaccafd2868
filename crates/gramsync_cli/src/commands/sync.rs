use std::sync::Arc;

use console::Term;
use gramsync::SyncSummary;

use crate::commands::shared::build_service;
use crate::config::Config;
use crate::progress::ProgressReporter;
use crate::shutdown;

pub(crate) async fn handle_sync(
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = build_service(config, database_url).await?;

    let reporter = Arc::new(ProgressReporter::new());
    let callback = reporter.as_callback();

    let outcome = tokio::select! {
        result = service.sync_all_posts_with_progress(Some(&*callback)) => Some(result),
        _ = shutdown::interrupted() => None,
    };
    reporter.finish();

    match outcome {
        Some(Ok(summary)) => {
            if Term::stdout().is_term() {
                println!("{}", summary_line(&summary));
            }
            Ok(())
        }
        Some(Err(e)) => Err(e.into()),
        None => Err("Sync interrupted; nothing was committed".into()),
    }
}

fn summary_line(summary: &SyncSummary) -> String {
    let mut line = format!(
        "Synced {} post{} and {} comment{}.",
        summary.posts,
        if summary.posts == 1 { "" } else { "s" },
        summary.comments,
        if summary.comments == 1 { "" } else { "s" },
    );
    if summary.skipped > 0 {
        line.push_str(&format!(" Skipped {} malformed item(s).", summary.skipped));
    }
    line
}
