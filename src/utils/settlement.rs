use crate::error::SettlementError;
use crate::models::{Game, OutcomeStatus, Wager, WagerStatus};
use crate::utils::outcome::calculate_outcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, error, info, warn};

/// Terminal result written for one wager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRecord {
    pub wager_id: String,
    pub game_id: String,
    pub status: OutcomeStatus,
    pub stake: i64,
    pub win_amount: i64,
    pub settled_at: DateTime<Utc>,
}

impl SettlementRecord {
    /// Amount returned to the bettor's bankroll: stake plus winnings on a win,
    /// the stake alone on a push
    pub fn bankroll_credit(&self) -> Result<i64, SettlementError> {
        match self.status {
            OutcomeStatus::Won => self.stake.checked_add(self.win_amount).ok_or_else(|| {
                SettlementError::AmountOverflow(format!("credit for wager {}", self.wager_id))
            }),
            OutcomeStatus::Push => Ok(self.stake),
            OutcomeStatus::Lost => Ok(0),
        }
    }
}

fn add_cents(total: i64, amount: i64, what: &str) -> Result<i64, SettlementError> {
    total
        .checked_add(amount)
        .ok_or_else(|| SettlementError::AmountOverflow(format!("total {}", what)))
}

/// A wager that could not be graded; it stays pending
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementFailure {
    pub wager_id: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: SettlementError,
}

fn serialize_display<S: Serializer>(error: &SettlementError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(error)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReport {
    pub game_id: String,
    pub home_score: u32,
    pub away_score: u32,
    pub records: Vec<SettlementRecord>,
    pub failures: Vec<SettlementFailure>,
    /// Wagers on this game that were already terminal
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementSummary {
    pub won: usize,
    pub lost: usize,
    pub push: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_staked: i64,
    pub total_won: i64,
    pub total_credited: i64,
}

impl SettlementSummary {
    /// Fold another summary in; on overflow `self` is left unchanged
    pub fn merge(&mut self, other: &SettlementSummary) -> Result<(), SettlementError> {
        let total_staked = add_cents(self.total_staked, other.total_staked, "staked")?;
        let total_won = add_cents(self.total_won, other.total_won, "won")?;
        let total_credited = add_cents(self.total_credited, other.total_credited, "credited")?;

        self.won += other.won;
        self.lost += other.lost;
        self.push += other.push;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.total_staked = total_staked;
        self.total_won = total_won;
        self.total_credited = total_credited;
        Ok(())
    }

    pub fn format(&self) -> String {
        format!(
            "Won: {} | Lost: {} | Push: {} | Failed: {} | Skipped: {} | Staked: ${:.2} | Winnings: ${:.2} | Credited: ${:.2}",
            self.won,
            self.lost,
            self.push,
            self.failed,
            self.skipped,
            self.total_staked as f64 / 100.0,
            self.total_won as f64 / 100.0,
            self.total_credited as f64 / 100.0
        )
    }
}

impl SettlementReport {
    pub fn summary(&self) -> Result<SettlementSummary, SettlementError> {
        let mut summary = SettlementSummary {
            failed: self.failures.len(),
            skipped: self.skipped,
            ..Default::default()
        };

        for record in &self.records {
            match record.status {
                OutcomeStatus::Won => summary.won += 1,
                OutcomeStatus::Lost => summary.lost += 1,
                OutcomeStatus::Push => summary.push += 1,
            }
            summary.total_staked = add_cents(summary.total_staked, record.stake, "staked")?;
            summary.total_won = add_cents(summary.total_won, record.win_amount, "won")?;
            summary.total_credited =
                add_cents(summary.total_credited, record.bankroll_credit()?, "credited")?;
        }

        Ok(summary)
    }
}

/// Settle every pending wager placed on a finished game.
///
/// Wagers on other games are ignored and terminal wagers are skipped, so
/// running this twice over the same slice settles nothing the second time.
/// A wager that fails to grade is reported and left pending; the rest of the
/// batch still settles.
pub fn settle_game(
    game: &Game,
    wagers: &mut [Wager],
    settled_at: DateTime<Utc>,
) -> Result<SettlementReport, SettlementError> {
    let (home_score, away_score) = game.final_score()?;

    let mut records = Vec::new();
    let mut failures = Vec::new();
    let mut skipped = 0;

    for wager in wagers.iter_mut().filter(|w| w.game_id == game.id) {
        if wager.status() != WagerStatus::Pending {
            debug!(wager_id = %wager.id, status = %wager.status(), "skipping settled wager");
            skipped += 1;
            continue;
        }

        let graded = calculate_outcome(wager, game, home_score, away_score).and_then(|outcome| {
            let record = SettlementRecord {
                wager_id: wager.id.clone(),
                game_id: game.id.clone(),
                status: outcome.status,
                stake: wager.stake,
                win_amount: outcome.win_amount,
                settled_at,
            };
            // A record whose credit can't be represented is never written
            record.bankroll_credit()?;
            Ok(record)
        });

        match graded {
            Ok(record) => {
                wager.settle(record.status)?;
                records.push(record);
            }
            Err(e) => {
                error!(wager_id = %wager.id, game_id = %game.id, error = %e, "failed to settle wager");
                failures.push(SettlementFailure {
                    wager_id: wager.id.clone(),
                    error: e,
                });
            }
        }
    }

    let report = SettlementReport {
        game_id: game.id.clone(),
        home_score,
        away_score,
        records,
        failures,
        skipped,
    };

    match report.summary() {
        Ok(summary) => info!(
            game_id = %game.id,
            "{} @ {} ({}-{}): {}",
            game.away_team,
            game.home_team,
            away_score,
            home_score,
            summary.format()
        ),
        Err(e) => warn!(game_id = %game.id, error = %e, "settled game but could not total it"),
    }

    Ok(report)
}

/// Settle every finished game in `games`; unfinished games are left alone
pub fn settle_all(
    games: &[Game],
    wagers: &mut [Wager],
    settled_at: DateTime<Utc>,
) -> Vec<SettlementReport> {
    games
        .iter()
        .filter_map(|game| match settle_game(game, wagers, settled_at) {
            Ok(report) => Some(report),
            Err(e) => {
                debug!(game_id = %game.id, error = %e, "not settling game");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Selection, TotalType};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 4, 30, 0).unwrap()
    }

    fn wagers() -> Vec<Wager> {
        vec![
            Wager::new(
                "w1",
                "g1",
                Selection::Spread {
                    team: "Lakers".to_string(),
                    line: -7.0,
                },
                1000,
                -110,
                909,
            )
            .unwrap(),
            Wager::new(
                "w2",
                "g1",
                Selection::Total {
                    total_type: TotalType::Over,
                    line: 45.5,
                },
                2000,
                -110,
                1818,
            )
            .unwrap(),
            Wager::new(
                "w3",
                "g1",
                Selection::Spread {
                    team: "Lakers".to_string(),
                    line: -10.0,
                },
                500,
                -110,
                454,
            )
            .unwrap(),
            Wager::new(
                "w4",
                "g2",
                Selection::Moneyline {
                    team: "Knicks".to_string(),
                },
                1000,
                120,
                1200,
            )
            .unwrap(),
        ]
    }

    #[test]
    fn test_settle_game() {
        let game = Game::new("g1", "Lakers", "Celtics").with_score(24, 14);
        let mut wagers = wagers();

        let report = settle_game(&game, &mut wagers, now()).unwrap();
        assert_eq!(report.records.len(), 3);
        assert!(report.failures.is_empty());

        assert_eq!(wagers[0].status(), WagerStatus::Won);
        assert_eq!(wagers[1].status(), WagerStatus::Lost);
        assert_eq!(wagers[2].status(), WagerStatus::Push);
        // Other game untouched
        assert_eq!(wagers[3].status(), WagerStatus::Pending);

        let summary = report.summary().unwrap();
        assert_eq!(summary.won, 1);
        assert_eq!(summary.lost, 1);
        assert_eq!(summary.push, 1);
        assert_eq!(summary.total_staked, 3500);
        assert_eq!(summary.total_won, 909);
        // Winner gets stake + win, push gets stake back
        assert_eq!(summary.total_credited, 1000 + 909 + 500);
    }

    #[test]
    fn test_settle_game_is_idempotent() {
        let game = Game::new("g1", "Lakers", "Celtics").with_score(24, 14);
        let mut wagers = wagers();

        let first = settle_game(&game, &mut wagers, now()).unwrap();
        let statuses: Vec<_> = wagers.iter().map(|w| w.status()).collect();

        let second = settle_game(&game, &mut wagers, now()).unwrap();
        assert_eq!(first.records.len(), 3);
        assert!(second.records.is_empty());
        assert_eq!(second.skipped, 3);
        assert_eq!(
            wagers.iter().map(|w| w.status()).collect::<Vec<_>>(),
            statuses
        );
    }

    #[test]
    fn test_failures_leave_wager_pending() {
        // Team names on the game don't match the wagers
        let game = Game::new("g2", "Nets", "Bulls").with_score(100, 90);
        let mut wagers = wagers();

        let report = settle_game(&game, &mut wagers, now()).unwrap();
        assert!(report.records.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].wager_id, "w4");
        assert!(matches!(
            report.failures[0].error,
            SettlementError::UnknownTeam { .. }
        ));
        assert_eq!(wagers[3].status(), WagerStatus::Pending);

        let value = serde_json::to_value(&report).unwrap();
        assert!(value["failures"][0]["error"]
            .as_str()
            .unwrap()
            .contains("Knicks"));
    }

    #[test]
    fn test_unfinished_game_is_not_settled() {
        let game = Game::new("g1", "Lakers", "Celtics");
        let mut wagers = wagers();
        assert_eq!(
            settle_game(&game, &mut wagers, now()).unwrap_err(),
            SettlementError::GameNotFinal("g1".to_string())
        );
        assert!(wagers.iter().all(|w| w.status() == WagerStatus::Pending));
    }

    #[test]
    fn test_settle_all_skips_unfinished_games() {
        let games = vec![
            Game::new("g1", "Lakers", "Celtics").with_score(24, 14),
            Game::new("g2", "Knicks", "Heat"),
        ];
        let mut wagers = wagers();

        let reports = settle_all(&games, &mut wagers, now());
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].game_id, "g1");
        assert_eq!(wagers[3].status(), WagerStatus::Pending);
    }

    #[test]
    fn test_bankroll_credit() {
        let mut record = SettlementRecord {
            wager_id: "w1".to_string(),
            game_id: "g1".to_string(),
            status: OutcomeStatus::Won,
            stake: 1000,
            win_amount: 909,
            settled_at: now(),
        };
        assert_eq!(record.bankroll_credit().unwrap(), 1909);

        record.status = OutcomeStatus::Push;
        record.win_amount = 0;
        assert_eq!(record.bankroll_credit().unwrap(), 1000);

        record.status = OutcomeStatus::Lost;
        assert_eq!(record.bankroll_credit().unwrap(), 0);

        record.status = OutcomeStatus::Won;
        record.stake = i64::MAX;
        record.win_amount = 1;
        assert!(matches!(
            record.bankroll_credit(),
            Err(SettlementError::AmountOverflow(_))
        ));
    }

    #[test]
    fn test_oversized_win_stays_pending() {
        let game = Game::new("g1", "Lakers", "Celtics").with_score(24, 14);
        let mut wagers = vec![Wager::new(
            "w1",
            "g1",
            Selection::Moneyline {
                team: "Lakers".to_string(),
            },
            i64::MAX,
            150,
            1,
        )
        .unwrap()];

        let report = settle_game(&game, &mut wagers, now()).unwrap();
        assert!(report.records.is_empty());
        assert!(matches!(
            report.failures[0].error,
            SettlementError::AmountOverflow(_)
        ));
        assert_eq!(wagers[0].status(), WagerStatus::Pending);
    }

    #[test]
    fn test_summary_totals_overflow() {
        let record = SettlementRecord {
            wager_id: "w1".to_string(),
            game_id: "g1".to_string(),
            status: OutcomeStatus::Lost,
            stake: i64::MAX,
            win_amount: 0,
            settled_at: now(),
        };
        let report = SettlementReport {
            game_id: "g1".to_string(),
            home_score: 24,
            away_score: 14,
            records: vec![record.clone(), record],
            failures: Vec::new(),
            skipped: 0,
        };
        assert!(matches!(
            report.summary(),
            Err(SettlementError::AmountOverflow(_))
        ));

        let mut total = SettlementSummary {
            lost: 1,
            total_staked: i64::MAX,
            ..Default::default()
        };
        let before = total.clone();
        assert!(total.merge(&before).is_err());
        assert_eq!(total, before);
    }
}
