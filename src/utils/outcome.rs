use crate::error::SettlementError;
use crate::models::{Game, OutcomeStatus, Selection, Side, TotalType, Wager};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Graded result of a wager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub status: OutcomeStatus,
    /// `potential_win` on a win, zero otherwise. A push refunds the stake,
    /// which is not part of this amount.
    pub win_amount: i64,
}

impl Outcome {
    fn won(potential_win: i64) -> Self {
        Self {
            status: OutcomeStatus::Won,
            win_amount: potential_win,
        }
    }

    fn lost() -> Self {
        Self {
            status: OutcomeStatus::Lost,
            win_amount: 0,
        }
    }

    fn push() -> Self {
        Self {
            status: OutcomeStatus::Push,
            win_amount: 0,
        }
    }

    fn decided(won: bool, potential_win: i64) -> Self {
        if won {
            Self::won(potential_win)
        } else {
            Self::lost()
        }
    }
}

/// Grade a wager against a final score.
///
/// The wager's team is resolved against `game` by exact name. The game is not
/// checked for being final; the caller supplies the score it trusts.
pub fn calculate_outcome(
    wager: &Wager,
    game: &Game,
    home_score: u32,
    away_score: u32,
) -> Result<Outcome, SettlementError> {
    let home = f64::from(home_score);
    let away = f64::from(away_score);

    let outcome = match &wager.selection {
        Selection::Spread { team, line } => {
            let home_spread = home - away;
            // The line is added to the wagered team's margin
            let cover_margin = match game.side_of(team)? {
                Side::Home => home_spread + line,
                Side::Away => -home_spread + line,
            };

            if cover_margin > 0.0 {
                Outcome::won(wager.potential_win)
            } else if cover_margin < 0.0 {
                Outcome::lost()
            } else {
                Outcome::push()
            }
        }
        Selection::Total { total_type, line } => {
            let actual_total = home + away;
            if actual_total == *line {
                Outcome::push()
            } else {
                let over_hit = actual_total > *line;
                let won = match total_type {
                    TotalType::Over => over_hit,
                    TotalType::Under => !over_hit,
                };
                Outcome::decided(won, wager.potential_win)
            }
        }
        Selection::Moneyline { team } => {
            let side = game.side_of(team)?;
            if home_score == away_score {
                Outcome::push()
            } else {
                let won = match side {
                    Side::Home => home_score > away_score,
                    Side::Away => away_score > home_score,
                };
                Outcome::decided(won, wager.potential_win)
            }
        }
    };

    debug!(
        wager_id = %wager.id,
        selection = %wager.selection,
        home_score,
        away_score,
        status = ?outcome.status,
        "graded wager"
    );

    Ok(outcome)
}

/// Grade a wager using the score recorded on the game
pub fn settle_against_final(wager: &Wager, game: &Game) -> Result<Outcome, SettlementError> {
    let (home_score, away_score) = game.final_score()?;
    calculate_outcome(wager, game, home_score, away_score)
}
