use gramsync::instagram::GraphClient;
use gramsync::sync::InstagramService;

use crate::config::Config;

/// Connect to the database (applying pending migrations) and build the
/// sync service from configuration.
pub(crate) async fn build_service(
    config: &Config,
    database_url: &str,
) -> Result<InstagramService, Box<dyn std::error::Error>> {
    let token = config.instagram_token().ok_or(
        "No Instagram access token configured. Set GRAMSYNC_INSTAGRAM_TOKEN \
         or add `token` under [instagram] in your config file.",
    )?;

    let client = GraphClient::new(
        &config.instagram.endpoint,
        &token,
        config.instagram_timeout(),
    )?;
    let db = gramsync::connect_and_migrate(database_url).await?;

    Ok(InstagramService::new(db, client).with_author(config.instagram.author.clone()))
}
