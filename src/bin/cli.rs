use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use wager_settlement::api::Sport;
use wager_settlement::config::Config;
use wager_settlement::data::{
    load_from_cache, load_wagers, save_settlements_to_csv, save_to_cache, LoadedWagers,
};
use wager_settlement::fade::{calculate_fade_bet_with, FadeBet, FadePricing};
use wager_settlement::fetch_games_with_scores;
use wager_settlement::models::Game;
use wager_settlement::settlement::{settle_all, SettlementSummary};

#[derive(Parser)]
#[command(name = "cli", about = "Settle wagers against final scores and price fades")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Settle every pending wager on a finished game
    Settle {
        /// JSON array of wager records
        #[arg(long)]
        wagers: PathBuf,
        /// JSON array of games with final scores
        #[arg(long)]
        games: PathBuf,
        /// Write the settlement reports as JSON
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write the settlement records as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Show the opposite bet for a wager
    Fade {
        #[arg(long)]
        wagers: PathBuf,
        #[arg(long)]
        games: PathBuf,
        /// Wager to fade
        #[arg(long)]
        id: String,
        /// Stake in cents for the fade
        #[arg(long)]
        stake: Option<i64>,
        /// Price spread and total fades from the odds board
        #[arg(long)]
        market_pricing: bool,
    },
    /// Fetch the odds board and final scores into the cache
    Fetch {
        #[arg(long)]
        sport: Option<Sport>,
        /// Days of completed games to pull scores for (1-3)
        #[arg(long)]
        days: Option<u8>,
        #[arg(long)]
        use_cache: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = Config::from_env()?;
    config.logging.init();

    let cli = Cli::parse();
    match cli.command {
        Command::Settle {
            wagers,
            games,
            out,
            csv,
        } => settle(&wagers, &games, out, csv).map(|_| ()),
        Command::Fade {
            wagers,
            games,
            id,
            stake,
            market_pricing,
        } => {
            let pricing = if market_pricing {
                FadePricing::Market
            } else {
                config.fade_pricing
            };
            fade(&wagers, &games, &id, stake, pricing).map(|_| ())
        }
        Command::Fetch {
            sport,
            days,
            use_cache,
        } => {
            if let Some(sport) = sport {
                config.sport = sport;
            }
            if let Some(days) = days {
                config.scores_days_from = days;
            }
            let games = fetch_games_with_scores(&config, use_cache).await?;
            let finished = games.iter().filter(|g| g.final_score().is_ok()).count();
            println!(
                "{} games for {} ({} final)",
                games.len(),
                config.sport,
                finished
            );
            Ok(())
        }
    }
}

fn settle(
    wagers_file: &Path,
    games_file: &Path,
    out: Option<PathBuf>,
    csv: Option<PathBuf>,
) -> Result<SettlementSummary> {
    let LoadedWagers {
        mut wagers,
        rejected,
    } = load_wagers(wagers_file)?;
    let games: Vec<Game> = load_from_cache(games_file)?;
    info!(
        "Loaded {} wagers ({} rejected) and {} games",
        wagers.len(),
        rejected.len(),
        games.len()
    );

    let reports = settle_all(&games, &mut wagers, Utc::now());

    let mut total = SettlementSummary {
        failed: rejected.len(),
        ..Default::default()
    };
    for failure in &rejected {
        println!("Rejected {}: {}", failure.wager_id, failure.error);
    }

    for report in &reports {
        let summary = report.summary()?;
        println!(
            "{} ({}-{}): {}",
            report.game_id,
            report.home_score,
            report.away_score,
            summary.format()
        );
        for failure in &report.failures {
            warn!("{}: {}", failure.wager_id, failure.error);
        }
        total.merge(&summary)?;
    }

    if reports.is_empty() {
        println!("No finished games to settle.");
    }
    if !reports.is_empty() || !rejected.is_empty() {
        println!("\nTOTAL: {}", total.format());
    }

    if let Some(out) = out {
        save_to_cache(&reports, &out)?;
        println!("Saved settlement reports to {}", out.display());
    }

    if let Some(csv) = csv {
        let records: Vec<_> = reports
            .iter()
            .flat_map(|r| r.records.iter().cloned())
            .collect();
        save_settlements_to_csv(&records, &csv)?;
        println!("Saved {} settlement records to {}", records.len(), csv.display());
    }

    Ok(total)
}

fn fade(
    wagers_file: &Path,
    games_file: &Path,
    id: &str,
    stake: Option<i64>,
    pricing: FadePricing,
) -> Result<FadeBet> {
    let wagers = load_wagers(wagers_file)?;
    let games: Vec<Game> = load_from_cache(games_file)?;

    let wager = wagers
        .find(id)
        .with_context(|| format!("No wager with id {}", id))?
        .map_err(|e| e.clone())
        .with_context(|| format!("Wager {} is invalid", id))?;
    let game = games
        .iter()
        .find(|g| g.id == wager.game_id)
        .with_context(|| format!("No game with id {}", wager.game_id))?;

    let fade = calculate_fade_bet_with(wager, game, pricing)?;
    println!(
        "{} @ {} | Original: {} ({:+}) | Fade: {} | Implied: {:.1}%",
        game.away_team,
        game.home_team,
        wager.selection,
        wager.odds,
        fade,
        fade.implied_probability() * 100.0
    );

    if let Some(stake) = stake {
        let input = fade.clone().into_wager_input(stake)?;
        println!("{}", serde_json::to_string_pretty(&input)?);
    }

    Ok(fade)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wager_settlement::models::Selection;

    fn write_fixtures(dir: &Path) -> (PathBuf, PathBuf) {
        let wagers = dir.join("wagers.json");
        let games = dir.join("games.json");
        std::fs::write(
            &wagers,
            json!([
                {"id": "w1", "gameId": "g1", "betType": "spread",
                 "selection": {"team": "Lakers", "line": -7.0},
                 "stake": 1000, "odds": -110, "potentialWin": 909},
                {"id": "w9", "gameId": "g1", "betType": "spread",
                 "selection": {"team": "Lakers"},
                 "stake": 1000, "odds": -110, "potentialWin": 909}
            ])
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            &games,
            json!([
                {"id": "g1", "homeTeam": "Lakers", "awayTeam": "Celtics",
                 "completed": true, "homeScore": 24, "awayScore": 14}
            ])
            .to_string(),
        )
        .unwrap();
        (wagers, games)
    }

    #[test]
    fn test_settle_counts_rejected_wagers() {
        let dir = tempfile::tempdir().unwrap();
        let (wagers, games) = write_fixtures(dir.path());
        let csv = dir.path().join("settlements.csv");

        let total = settle(&wagers, &games, None, Some(csv.clone())).unwrap();
        assert_eq!(total.won, 1);
        assert_eq!(total.failed, 1);
        assert_eq!(std::fs::read_to_string(&csv).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_fade_reports_invalid_wager() {
        let dir = tempfile::tempdir().unwrap();
        let (wagers, games) = write_fixtures(dir.path());

        let err = fade(&wagers, &games, "w9", None, FadePricing::Standard).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Wager w9 is invalid"));
        assert!(message.contains("malformed spread selection"));

        let err = fade(&wagers, &games, "w404", None, FadePricing::Standard).unwrap_err();
        assert!(err.to_string().contains("No wager with id w404"));
    }

    #[test]
    fn test_fade_valid_wager() {
        let dir = tempfile::tempdir().unwrap();
        let (wagers, games) = write_fixtures(dir.path());

        let fade = fade(&wagers, &games, "w1", Some(1100), FadePricing::Standard).unwrap();
        assert_eq!(
            fade.selection,
            Selection::Spread {
                team: "Celtics".to_string(),
                line: 7.0
            }
        );
    }
}
