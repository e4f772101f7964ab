use crate::error::SettlementError;
use crate::models::{BetType, Game, Selection, Wager};
use crate::utils::odds::{american_odds_to_probability, potential_win};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Price used for spread and total fades when not reading the board
pub const STANDARD_ODDS: i32 = -110;

/// How spread and total fades are priced. Moneyline fades always read the
/// board's head-to-head prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadePricing {
    /// Flat -110 on both sides
    #[default]
    Standard,
    /// Counterparty price from the board at the exact opposite point,
    /// -110 when the board has none
    Market,
}

impl FromStr for FadePricing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(FadePricing::Standard),
            "market" => Ok(FadePricing::Market),
            other => Err(format!("unknown fade pricing '{}'", other)),
        }
    }
}

/// The opposite side of an existing wager, not yet staked
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FadeBet {
    pub game_id: String,
    pub bet_type: BetType,
    pub selection: Selection,
    pub odds: i32,
}

impl FadeBet {
    pub fn implied_probability(&self) -> f64 {
        american_odds_to_probability(self.odds)
    }

    /// Attach a stake, producing a wager input ready for placement
    pub fn into_wager_input(self, stake: i64) -> Result<WagerInput, SettlementError> {
        let potential_win = potential_win(stake, self.odds)?;
        Ok(WagerInput {
            game_id: self.game_id,
            bet_type: self.bet_type,
            selection: self.selection,
            stake,
            odds: self.odds,
            potential_win,
        })
    }
}

impl fmt::Display for FadeBet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_bet(&self.selection, self.odds))
    }
}

/// A new wager as submitted to placement. Amounts are integer cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WagerInput {
    pub game_id: String,
    pub bet_type: BetType,
    pub selection: Selection,
    pub stake: i64,
    pub odds: i32,
    pub potential_win: i64,
}

/// "Lakers -4.5 (-110)"
pub fn format_bet(selection: &Selection, odds: i32) -> String {
    format!("{} ({:+})", selection, odds)
}

/// Derive the opposite wager with standard spread/total pricing
pub fn calculate_fade_bet(original: &Wager, game: &Game) -> Result<FadeBet, SettlementError> {
    calculate_fade_bet_with(original, game, FadePricing::Standard)
}

/// Derive the opposite wager: same market, other side.
///
/// Spreads switch team and negate the line, totals flip over/under on the same
/// line, moneylines switch team and take the other team's head-to-head price.
pub fn calculate_fade_bet_with(
    original: &Wager,
    game: &Game,
    pricing: FadePricing,
) -> Result<FadeBet, SettlementError> {
    let market = game.odds_market.as_ref();

    let (selection, odds) = match &original.selection {
        Selection::Spread { team, line } => {
            let opposite_team = game.team(game.side_of(team)?.opposite()).to_string();
            // Pick'em stays 0.0 rather than -0.0
            let opposite_line = if *line == 0.0 { 0.0 } else { -line };
            let odds = match pricing {
                FadePricing::Standard => STANDARD_ODDS,
                FadePricing::Market => market
                    .and_then(|m| m.spread_price(&opposite_team, opposite_line))
                    .unwrap_or(STANDARD_ODDS),
            };
            (
                Selection::Spread {
                    team: opposite_team,
                    line: opposite_line,
                },
                odds,
            )
        }
        Selection::Total { total_type, line } => {
            let opposite_type = total_type.opposite();
            let odds = match pricing {
                FadePricing::Standard => STANDARD_ODDS,
                FadePricing::Market => market
                    .and_then(|m| m.total_price(opposite_type, *line))
                    .unwrap_or(STANDARD_ODDS),
            };
            (
                Selection::Total {
                    total_type: opposite_type,
                    line: *line,
                },
                odds,
            )
        }
        Selection::Moneyline { team } => {
            let opposite_side = game.side_of(team)?.opposite();
            let h2h = market.and_then(|m| m.h2h.as_ref()).ok_or_else(|| {
                SettlementError::MissingMarketData(format!(
                    "no moneyline prices for game {}",
                    game.id
                ))
            })?;
            (
                Selection::Moneyline {
                    team: game.team(opposite_side).to_string(),
                },
                h2h.price(opposite_side),
            )
        }
    };

    debug!(
        wager_id = %original.id,
        original = %original.selection,
        fade = %selection,
        odds,
        "calculated fade"
    );

    Ok(FadeBet {
        game_id: game.id.clone(),
        bet_type: selection.bet_type(),
        selection,
        odds,
    })
}
