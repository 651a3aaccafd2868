//! Gramsync CLI - command-line interface for the Instagram mirror.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::posts::OutputFormat;

#[derive(Parser)]
#[command(name = "gramsync")]
#[command(version)]
#[command(about = "Mirror Instagram posts and comments into a local database")]
#[command(
    long_about = "Gramsync imports every post of an Instagram account, together with its \
comments, into a local SQLite or PostgreSQL database in a single transaction. It can list \
the mirrored posts and relay new comments back to Instagram."
)]
#[command(after_long_help = r#"EXAMPLES
    Import all posts and comments:
        $ gramsync sync

    List the newest mirrored posts as JSON:
        $ gramsync posts --per-page 5 --output json

    Comment on the post with local id 12:
        $ gramsync comment 12 "Thanks for stopping by!"

    Generate shell completions:
        $ gramsync completions bash > ~/.local/share/bash-completion/completions/gramsync

CONFIGURATION
    Gramsync reads configuration from:
      1. ~/.config/gramsync/config.toml (or $XDG_CONFIG_HOME/gramsync/config.toml)
      2. ./gramsync.toml
      3. Environment variables (GRAMSYNC_* prefix, e.g., GRAMSYNC_INSTAGRAM_TOKEN)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    GRAMSYNC_DATABASE_URL         Database connection string (default: ~/.local/state/gramsync/gramsync.db)
    GRAMSYNC_INSTAGRAM_TOKEN      Instagram Graph API access token
    GRAMSYNC_INSTAGRAM_ENDPOINT   Graph API base URL (default: https://graph.instagram.com/v25.0)
    GRAMSYNC_INSTAGRAM_AUTHOR     Username recorded on relayed comments (default: me)
    GRAMSYNC_INSTAGRAM_TIMEOUT    Request timeout in seconds (default: 30)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Import all posts and their comments from Instagram
    ///
    /// Runs in a single transaction: if any request fails, or the sync is
    /// interrupted with Ctrl+C, nothing is written.
    Sync,
    /// List mirrored posts, newest first
    Posts {
        /// Page number (starting at 0)
        #[arg(short, long, default_value_t = 0)]
        page: u64,

        /// Posts per page
        #[arg(short = 'n', long, default_value_t = gramsync::store::DEFAULT_PER_PAGE)]
        per_page: u64,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Post a comment to Instagram and record it locally
    Comment {
        /// Local id of the post (as shown by `gramsync posts`)
        post_id: i32,

        /// Comment text
        text: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Structured logging only when not attached to a TTY
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("gramsync=info,gramsync_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config = config::Config::load();

    let cli = Cli::parse();

    // Handle commands that don't require database access first
    match &cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(*shell)?;
            return Ok(());
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output.clone())?;
            return Ok(());
        }
        _ => {}
    }

    let database_url = config
        .database_url()
        .ok_or("Could not determine a database URL; set GRAMSYNC_DATABASE_URL")?;

    ensure_sqlite_parent_dir(&database_url)?;

    match cli.command {
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Sync => {
            commands::sync::handle_sync(&config, &database_url).await?;
        }
        Commands::Posts {
            page,
            per_page,
            output,
        } => {
            commands::posts::handle_posts(&database_url, page, per_page, output).await?;
        }
        Commands::Comment { post_id, text } => {
            commands::comment::handle_comment(&config, &database_url, post_id, &text).await?;
        }
        Commands::Completions { .. } | Commands::Man { .. } => {}
    }

    Ok(())
}

/// Create the parent directory of a file-backed SQLite database.
fn ensure_sqlite_parent_dir(database_url: &str) -> std::io::Result<()> {
    let Some(db_path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    // Strip query parameters (e.g., ?mode=rwc) before path operations
    let db_path = db_path.split('?').next().unwrap_or(db_path);
    let db_path = std::path::Path::new(db_path);

    if db_path.is_relative() && !db_path.as_os_str().is_empty() {
        tracing::warn!(
            "Database path '{}' is relative - behavior depends on current directory. \
             Consider using an absolute path.",
            db_path.display()
        );
    }

    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
