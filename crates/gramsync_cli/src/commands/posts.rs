use clap::ValueEnum;
use gramsync::store::{PaginatedResult, Pagination, PostWithComments, posts};
use serde::Serialize;

/// Output format for listings.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// Longest caption shown in table output.
const CAPTION_WIDTH: usize = 48;

pub(crate) async fn handle_posts(
    database_url: &str,
    page: u64,
    per_page: u64,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = gramsync::connect_and_migrate(database_url).await?;
    let result = posts::list(&db, Pagination::new(page, per_page)).await?;

    match output {
        OutputFormat::Table => print_table(&result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}

/// One post as a table row.
#[derive(Debug, Clone, Serialize, tabled::Tabled)]
pub(crate) struct PostRow {
    #[tabled(rename = "ID")]
    pub id: i32,
    #[tabled(rename = "Instagram ID")]
    pub ig_id: String,
    #[tabled(rename = "Posted")]
    pub posted: String,
    #[tabled(rename = "Comments")]
    pub comments: usize,
    #[tabled(rename = "Caption")]
    pub caption: String,
}

impl From<&PostWithComments> for PostRow {
    fn from(item: &PostWithComments) -> Self {
        Self {
            id: item.post.id,
            ig_id: item.post.ig_id.clone(),
            posted: item.post.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            comments: item.comments.len(),
            caption: truncate(&item.post.caption, CAPTION_WIDTH),
        }
    }
}

fn print_table(result: &PaginatedResult<PostWithComments>) {
    if result.items.is_empty() {
        if result.total == 0 {
            println!("No posts yet. Run `gramsync sync` first.");
        } else {
            println!(
                "Page {} is empty ({} post(s) in {} page(s)).",
                result.page, result.total, result.total_pages
            );
        }
        return;
    }

    let rows: Vec<PostRow> = result.items.iter().map(PostRow::from).collect();
    let mut table = tabled::Table::new(rows);
    table.with(tabled::settings::Style::rounded());
    println!("{}", table);
    println!(
        "Page {} of {} ({} post(s)){}",
        result.page + 1,
        result.total_pages,
        result.total,
        if result.has_next() {
            format!(", next: --page {}", result.page + 1)
        } else {
            String::new()
        }
    );
}

/// Single-line caption, cut to `width` characters.
fn truncate(text: &str, width: usize) -> String {
    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() > width {
        let cut: String = line.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        line
    }
}
