use crate::api::Sport;
use crate::models::{Game, H2hOdds, OddsMarket, SpreadOdds, TotalOdds, TotalType};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

const ODDS_API_BASE_URL: &str = "https://api.the-odds-api.com/v4";

/// Response from The Odds API for a single game
#[derive(Debug, Deserialize)]
struct OddsApiGame {
    id: String,
    commence_time: DateTime<Utc>,
    home_team: String,
    away_team: String,
    #[serde(default)]
    bookmakers: Vec<OddsApiBookmaker>,
}

/// Bookmaker data from The Odds API
#[derive(Debug, Deserialize)]
struct OddsApiBookmaker {
    key: String,
    markets: Vec<OddsApiMarket>,
}

/// Market data (h2h, spreads, totals) from The Odds API
#[derive(Debug, Deserialize)]
struct OddsApiMarket {
    key: String,
    outcomes: Vec<OddsApiOutcome>,
}

/// Outcome data for a team, or "Over"/"Under" on totals
#[derive(Debug, Deserialize)]
struct OddsApiOutcome {
    name: String,
    price: f64,
    #[serde(default)]
    point: Option<f64>,
}

/// Entry from the scores endpoint
#[derive(Debug, Deserialize)]
struct OddsApiScore {
    id: String,
    commence_time: DateTime<Utc>,
    completed: bool,
    home_team: String,
    away_team: String,
    #[serde(default)]
    scores: Option<Vec<OddsApiTeamScore>>,
}

#[derive(Debug, Deserialize)]
struct OddsApiTeamScore {
    name: String,
    score: String,
}

pub struct OddsApiClient {
    api_key: String,
    bookmaker: Option<String>,
    client: reqwest::Client,
}

impl OddsApiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            bookmaker: None,
            client: reqwest::Client::new(),
        }
    }

    /// Build each game's board from this bookmaker when it lists the game
    pub fn with_bookmaker(mut self, bookmaker: Option<String>) -> Self {
        self.bookmaker = bookmaker;
        self
    }

    /// Fetch upcoming games with their moneyline, spread and total board
    pub async fn fetch_games(&self, sport: Sport) -> Result<Vec<Game>> {
        let url = format!("{}/sports/{}/odds", ODDS_API_BASE_URL, sport.key());

        let response = self
            .client
            .get(&url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("regions", "us"),
                ("markets", "h2h,spreads,totals"),
                ("oddsFormat", "american"),
            ])
            .send()
            .await
            .context("Failed to fetch odds from The Odds API")?;

        if !response.status().is_success() {
            anyhow::bail!("Odds API returned error: {}", response.status());
        }

        let api_games: Vec<OddsApiGame> = response
            .json()
            .await
            .context("Failed to parse Odds API response")?;

        let games = games_from_odds(api_games, self.bookmaker.as_deref());
        info!(sport = %sport, count = games.len(), "fetched odds board");
        Ok(games)
    }

    /// Fetch final scores for games completed in the last `days_from` days (1-3)
    pub async fn fetch_scores(&self, sport: Sport, days_from: u8) -> Result<Vec<Game>> {
        let url = format!("{}/sports/{}/scores", ODDS_API_BASE_URL, sport.key());
        let days_from = days_from.clamp(1, 3).to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("daysFrom", days_from.as_str()),
                ("dateFormat", "iso"),
            ])
            .send()
            .await
            .context("Failed to fetch scores from The Odds API")?;

        if !response.status().is_success() {
            anyhow::bail!("Odds API returned error: {}", response.status());
        }

        let api_scores: Vec<OddsApiScore> = response
            .json()
            .await
            .context("Failed to parse Odds API scores response")?;

        let games = games_from_scores(api_scores);
        info!(sport = %sport, count = games.len(), "fetched final scores");
        Ok(games)
    }

    /// Check how many API requests you have remaining
    pub async fn check_usage(&self) -> Result<()> {
        let url = format!("{}/sports", ODDS_API_BASE_URL);

        let response = self
            .client
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        if let Some(remaining) = response.headers().get("x-requests-remaining") {
            info!("API requests remaining: {:?}", remaining);
        }

        if let Some(used) = response.headers().get("x-requests-used") {
            info!("API requests used: {:?}", used);
        }

        Ok(())
    }
}

/// Overlay final scores onto boards by game id. Scored games with no board
/// are kept; they can still be settled.
pub fn merge_scores(boards: Vec<Game>, scores: Vec<Game>) -> Vec<Game> {
    let mut scores: HashMap<String, Game> =
        scores.into_iter().map(|g| (g.id.clone(), g)).collect();

    let mut merged: Vec<Game> = boards
        .into_iter()
        .map(|mut game| {
            if let Some(scored) = scores.remove(&game.id) {
                game.home_score = scored.home_score;
                game.away_score = scored.away_score;
                game.completed = scored.completed;
            }
            game
        })
        .collect();

    let mut leftovers: Vec<Game> = scores.into_values().collect();
    leftovers.sort_by(|a, b| a.id.cmp(&b.id));
    merged.extend(leftovers);
    merged
}

fn games_from_odds(api_games: Vec<OddsApiGame>, bookmaker: Option<&str>) -> Vec<Game> {
    api_games
        .into_iter()
        .map(|api_game| {
            let odds_market = build_market(&api_game, bookmaker);
            Game {
                id: api_game.id,
                home_team: api_game.home_team,
                away_team: api_game.away_team,
                commence_time: Some(api_game.commence_time),
                completed: false,
                home_score: None,
                away_score: None,
                odds_market,
            }
        })
        .collect()
}

/// Board from the preferred bookmaker, else the first one quoting any market
fn build_market(api_game: &OddsApiGame, bookmaker: Option<&str>) -> Option<OddsMarket> {
    let chosen = bookmaker
        .and_then(|key| api_game.bookmakers.iter().find(|b| b.key == key))
        .or_else(|| api_game.bookmakers.iter().find(|b| !b.markets.is_empty()))?;

    let mut market = OddsMarket::default();
    for api_market in &chosen.markets {
        match api_market.key.as_str() {
            "h2h" => {
                let price_for = |team: &str| {
                    api_market
                        .outcomes
                        .iter()
                        .find(|o| o.name == team)
                        .map(|o| o.price.round() as i32)
                };
                if let (Some(home), Some(away)) = (
                    price_for(&api_game.home_team),
                    price_for(&api_game.away_team),
                ) {
                    market.h2h = Some(H2hOdds { home, away });
                }
            }
            "spreads" => {
                market.spreads = api_market
                    .outcomes
                    .iter()
                    .filter_map(|o| {
                        Some(SpreadOdds {
                            team: o.name.clone(),
                            point: o.point?,
                            price: o.price.round() as i32,
                        })
                    })
                    .collect();
            }
            "totals" => {
                market.totals = api_market
                    .outcomes
                    .iter()
                    .filter_map(|o| {
                        let total_type = match o.name.as_str() {
                            "Over" => TotalType::Over,
                            "Under" => TotalType::Under,
                            _ => return None,
                        };
                        Some(TotalOdds {
                            total_type,
                            point: o.point?,
                            price: o.price.round() as i32,
                        })
                    })
                    .collect();
            }
            other => debug!(market = other, "ignoring market"),
        }
    }

    Some(market)
}

fn games_from_scores(api_scores: Vec<OddsApiScore>) -> Vec<Game> {
    api_scores
        .into_iter()
        .filter(|s| s.completed)
        .filter_map(|api_score| {
            let scores = api_score.scores.as_ref()?;
            let score_for = |team: &str| -> Option<u32> {
                let entry = scores.iter().find(|s| s.name == team)?;
                match entry.score.trim().parse() {
                    Ok(score) => Some(score),
                    Err(_) => {
                        warn!(game_id = %api_score.id, team, score = %entry.score, "unparseable score");
                        None
                    }
                }
            };
            let home_score = score_for(&api_score.home_team)?;
            let away_score = score_for(&api_score.away_team)?;

            let mut game = Game::new(
                api_score.id.clone(),
                api_score.home_team.clone(),
                api_score.away_team.clone(),
            )
            .with_score(home_score, away_score);
            game.commence_time = Some(api_score.commence_time);
            Some(game)
        })
        .collect()
}
