use std::sync::Mutex;
use std::time::Duration;

use gramsync::sync::SyncProgress;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Interactive progress reporter using indicatif.
///
/// One spinner counts posts as they are written; skipped items are printed
/// above it so they stay visible after the spinner finishes.
pub struct InteractiveReporter {
    spinner: Mutex<Option<ProgressBar>>,
    draw_target: fn() -> ProgressDrawTarget,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
            draw_target: ProgressDrawTarget::stderr,
        }
    }

    /// Reporter that draws nothing (tests).
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self {
            spinner: Mutex::new(None),
            draw_target: ProgressDrawTarget::hidden,
        }
    }

    fn start_spinner(&self, slot: &mut Option<ProgressBar>, message: String) -> ProgressBar {
        let pb = ProgressBar::with_draw_target(None, (self.draw_target)());
        pb.set_style(Self::counter_style());
        pb.set_prefix("instagram");
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        *slot = Some(pb.clone());
        pb
    }

    pub fn handle(&self, event: SyncProgress) {
        let mut slot = self.spinner.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            SyncProgress::FetchingPosts { page_size } => {
                self.start_spinner(&mut slot, format!("posts ({} per page)", page_size));
            }

            SyncProgress::PostSynced {
                ig_id,
                comments,
                total_so_far,
            } => {
                if let Some(pb) = slot.as_ref() {
                    pb.set_position(total_so_far as u64);
                    pb.set_message(format!("posts, last {} with {} comment(s)", ig_id, comments));
                }
            }

            SyncProgress::ItemSkipped {
                kind,
                ig_id,
                reason,
            } => {
                let line = format!(
                    "  skipped {} {}: {}",
                    kind,
                    ig_id.as_deref().unwrap_or("(no id)"),
                    reason
                );
                match slot.as_ref() {
                    Some(pb) => pb.println(line),
                    None => eprintln!("{}", line),
                }
            }

            SyncProgress::SyncComplete { posts, .. } => {
                if let Some(pb) = slot.take() {
                    pb.set_position(posts as u64);
                    pb.finish_with_message("posts committed");
                }
            }

            SyncProgress::SyncAborted { error } => {
                if let Some(pb) = slot.take() {
                    pb.abandon_with_message(format!("aborted: {}", error));
                }
            }

            SyncProgress::CommentRelayed {
                post_ig_id,
                comment_ig_id,
            } => {
                let line = format!("  posted comment {} on {}", comment_ig_id, post_ig_id);
                match slot.as_ref() {
                    Some(pb) => pb.println(line),
                    None => eprintln!("{}", line),
                }
            }

            _ => {}
        }
    }

    /// Finish the spinner if a sync left it running.
    pub fn finish(&self) {
        let mut slot = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pb) = slot.take()
            && !pb.is_finished()
        {
            pb.abandon();
        }
    }

    fn counter_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {pos:>4} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
