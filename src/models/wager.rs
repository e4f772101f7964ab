use crate::error::SettlementError;
use crate::utils::odds::validate_american_odds;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Market a wager is placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetType {
    Spread,
    Total,
    Moneyline,
}

impl BetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetType::Spread => "spread",
            BetType::Total => "total",
            BetType::Moneyline => "moneyline",
        }
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BetType {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spread" => Ok(BetType::Spread),
            "total" => Ok(BetType::Total),
            "moneyline" => Ok(BetType::Moneyline),
            other => Err(SettlementError::UnsupportedBetType(other.to_string())),
        }
    }
}

/// Side of a totals market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalType {
    Over,
    Under,
}

impl TotalType {
    pub fn opposite(self) -> Self {
        match self {
            TotalType::Over => TotalType::Under,
            TotalType::Under => TotalType::Over,
        }
    }
}

impl fmt::Display for TotalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TotalType::Over => f.write_str("Over"),
            TotalType::Under => f.write_str("Under"),
        }
    }
}

/// What the wager is on. The variant fixes the bet type.
///
/// Serializes as the bare selection object (`{"team", "line"}`,
/// `{"totalType", "line"}` or `{"team"}`); the bet type travels next to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Selection {
    /// `line` is added to `team`'s scoring margin
    Spread { team: String, line: f64 },
    Total {
        #[serde(rename = "totalType")]
        total_type: TotalType,
        line: f64,
    },
    Moneyline { team: String },
}

#[derive(Deserialize)]
struct RawSpread {
    team: String,
    line: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTotal {
    total_type: TotalType,
    line: f64,
}

#[derive(Deserialize)]
struct RawMoneyline {
    team: String,
}

impl Selection {
    /// Parse the selection object stored next to a `betType` discriminant
    pub fn parse(bet_type: BetType, raw: &Value) -> Result<Self, SettlementError> {
        let malformed = |reason: String| SettlementError::MalformedSelection {
            bet_type: bet_type.to_string(),
            reason,
        };

        let selection = match bet_type {
            BetType::Spread => {
                let raw: RawSpread =
                    serde_json::from_value(raw.clone()).map_err(|e| malformed(e.to_string()))?;
                Selection::Spread {
                    team: raw.team,
                    line: raw.line,
                }
            }
            BetType::Total => {
                let raw: RawTotal =
                    serde_json::from_value(raw.clone()).map_err(|e| malformed(e.to_string()))?;
                Selection::Total {
                    total_type: raw.total_type,
                    line: raw.line,
                }
            }
            BetType::Moneyline => {
                let raw: RawMoneyline =
                    serde_json::from_value(raw.clone()).map_err(|e| malformed(e.to_string()))?;
                Selection::Moneyline { team: raw.team }
            }
        };

        selection.validate()?;
        Ok(selection)
    }

    pub fn validate(&self) -> Result<(), SettlementError> {
        let malformed = |reason: &str| SettlementError::MalformedSelection {
            bet_type: self.bet_type().to_string(),
            reason: reason.to_string(),
        };

        if let Some(team) = self.team() {
            if team.trim().is_empty() {
                return Err(malformed("team is empty"));
            }
        }
        if let Some(line) = self.line() {
            if !line.is_finite() {
                return Err(malformed("line is not a finite number"));
            }
        }
        Ok(())
    }

    pub fn bet_type(&self) -> BetType {
        match self {
            Selection::Spread { .. } => BetType::Spread,
            Selection::Total { .. } => BetType::Total,
            Selection::Moneyline { .. } => BetType::Moneyline,
        }
    }

    pub fn team(&self) -> Option<&str> {
        match self {
            Selection::Spread { team, .. } | Selection::Moneyline { team } => Some(team),
            Selection::Total { .. } => None,
        }
    }

    pub fn line(&self) -> Option<f64> {
        match self {
            Selection::Spread { line, .. } | Selection::Total { line, .. } => Some(*line),
            Selection::Moneyline { .. } => None,
        }
    }

    /// Selection object in the backend's record shape
    pub fn to_value(&self) -> Value {
        match self {
            Selection::Spread { team, line } => json!({ "team": team, "line": line }),
            Selection::Total { total_type, line } => {
                json!({ "totalType": total_type, "line": line })
            }
            Selection::Moneyline { team } => json!({ "team": team }),
        }
    }
}

/// Short display string, e.g. "Lakers -4.5", "Over 220.5", "Lakers ML"
impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Spread { team, line } if *line == 0.0 => write!(f, "{} PK", team),
            Selection::Spread { team, line } => write!(f, "{} {:+}", team, line),
            Selection::Total { total_type, line } => write!(f, "{} {}", total_type, line),
            Selection::Moneyline { team } => write!(f, "{} ML", team),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WagerStatus {
    #[default]
    Pending,
    Won,
    Lost,
    Push,
    Cancelled,
}

impl WagerStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WagerStatus::Pending)
    }
}

impl fmt::Display for WagerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WagerStatus::Pending => "pending",
            WagerStatus::Won => "won",
            WagerStatus::Lost => "lost",
            WagerStatus::Push => "push",
            WagerStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Result of grading a wager against a final score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Won,
    Lost,
    Push,
}

impl From<OutcomeStatus> for WagerStatus {
    fn from(status: OutcomeStatus) -> Self {
        match status {
            OutcomeStatus::Won => WagerStatus::Won,
            OutcomeStatus::Lost => WagerStatus::Lost,
            OutcomeStatus::Push => WagerStatus::Push,
        }
    }
}

/// Wager row as stored by the backend (camelCase JSON)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WagerRecord {
    pub id: String,
    pub game_id: String,
    pub bet_type: String,
    pub selection: Value,
    pub stake: i64,
    pub odds: i32,
    pub potential_win: i64,
    #[serde(default)]
    pub status: WagerStatus,
}

/// A validated wager. Amounts are integer cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WagerRecord", into = "WagerRecord")]
pub struct Wager {
    pub id: String,
    pub game_id: String,
    pub selection: Selection,
    pub stake: i64,
    pub odds: i32,
    /// Profit paid on a win, fixed at placement time
    pub potential_win: i64,
    status: WagerStatus,
}

impl Wager {
    /// Build a pending wager
    pub fn new(
        id: impl Into<String>,
        game_id: impl Into<String>,
        selection: Selection,
        stake: i64,
        odds: i32,
        potential_win: i64,
    ) -> Result<Self, SettlementError> {
        selection.validate()?;
        if stake <= 0 {
            return Err(SettlementError::InvalidStake(stake));
        }
        if potential_win < 0 {
            return Err(SettlementError::InvalidPotentialWin(potential_win));
        }
        validate_american_odds(odds)?;

        Ok(Self {
            id: id.into(),
            game_id: game_id.into(),
            selection,
            stake,
            odds,
            potential_win,
            status: WagerStatus::Pending,
        })
    }

    pub fn bet_type(&self) -> BetType {
        self.selection.bet_type()
    }

    pub fn status(&self) -> WagerStatus {
        self.status
    }

    /// Move a pending wager to its graded status. Terminal wagers never reopen.
    pub fn settle(&mut self, outcome: OutcomeStatus) -> Result<(), SettlementError> {
        self.transition(outcome.into())
    }

    pub fn cancel(&mut self) -> Result<(), SettlementError> {
        self.transition(WagerStatus::Cancelled)
    }

    fn transition(&mut self, next: WagerStatus) -> Result<(), SettlementError> {
        if self.status.is_terminal() {
            return Err(SettlementError::AlreadySettled {
                id: self.id.clone(),
                status: self.status.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}

impl TryFrom<WagerRecord> for Wager {
    type Error = SettlementError;

    fn try_from(record: WagerRecord) -> Result<Self, Self::Error> {
        let bet_type: BetType = record.bet_type.parse()?;
        let selection = Selection::parse(bet_type, &record.selection)?;
        let mut wager = Wager::new(
            record.id,
            record.game_id,
            selection,
            record.stake,
            record.odds,
            record.potential_win,
        )?;
        wager.status = record.status;
        Ok(wager)
    }
}

impl From<Wager> for WagerRecord {
    fn from(wager: Wager) -> Self {
        Self {
            bet_type: wager.bet_type().to_string(),
            selection: wager.selection.to_value(),
            id: wager.id,
            game_id: wager.game_id,
            stake: wager.stake,
            odds: wager.odds,
            potential_win: wager.potential_win,
            status: wager.status,
        }
    }
}
