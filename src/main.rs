use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing::info;

use sidecord::domain::entities::AuthToken;
use sidecord::infrastructure::{CliArgs, DiscordClient, ImageLoader, StorageManager, logging};
use sidecord::presentation::App;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(args);
    logging::init(&config)?;

    info!(version = sidecord::VERSION, "Starting {}", sidecord::NAME);

    let token = config
        .token
        .as_deref()
        .and_then(AuthToken::parse)
        .ok_or_else(|| eyre!("a valid Discord token is required (--token or DISCORD_TOKEN)"))?;
    info!(token = %token.masked(), "Using token");

    let client = Arc::new(DiscordClient::new(token)?);
    let images = Arc::new(ImageLoader::with_defaults().await?);
    let app = App::new(client, images, config, storage);

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal).await;
    ratatui::restore();

    info!("Goodbye");
    result
}
