pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod utils;

pub use api::*;
pub use error::*;
pub use models::*;
pub use utils::*;

use anyhow::{Context, Result};
use api::odds_api::{merge_scores, OddsApiClient};
use config::Config;
use tracing::info;
use utils::data::{load_from_cache, save_to_cache};

/// Fetch the odds board and recent final scores for the configured sport,
/// merged into one list of games. With `use_cache`, previously saved files
/// are read instead of calling the API.
pub async fn fetch_games_with_scores(config: &Config, use_cache: bool) -> Result<Vec<Game>> {
    let games_cache_file = config.games_cache_file();
    let scores_cache_file = config.scores_cache_file();

    if use_cache && games_cache_file.exists() {
        info!("Loading games from cache file: {}", games_cache_file.display());
        return load_from_cache(&games_cache_file);
    }

    let client = OddsApiClient::new(config.require_api_key()?.to_string())
        .with_bookmaker(config.bookmaker.clone());

    let boards = client
        .fetch_games(config.sport)
        .await
        .context("Failed to fetch odds board")?;

    let scores = if use_cache && scores_cache_file.exists() {
        load_from_cache(&scores_cache_file)?
    } else {
        let scores = client
            .fetch_scores(config.sport, config.scores_days_from)
            .await
            .context("Failed to fetch scores")?;
        save_to_cache(&scores, &scores_cache_file)?;
        scores
    };

    let games = merge_scores(boards, scores);
    save_to_cache(&games, &games_cache_file)?;
    info!("Saved {} games to {}", games.len(), games_cache_file.display());

    client.check_usage().await?;

    Ok(games)
}
