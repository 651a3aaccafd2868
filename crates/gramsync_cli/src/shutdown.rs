use console::Term;

/// Resolve once the user presses Ctrl+C.
///
/// Used to race a running sync: dropping the sync future drops its open
/// transaction, which rolls back every write made so far.
pub(crate) async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        // Never resolve: without a handler the operation just runs to completion.
        std::future::pending::<()>().await;
    }

    if Term::stdout().is_term() {
        eprintln!("\n\nInterrupted, rolling back...");
    } else {
        tracing::warn!("Interrupted, rolling back");
    }
}
