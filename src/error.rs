use thiserror::Error;

/// Errors raised while parsing, settling or fading a wager.
///
/// Every variant means the inputs were wrong; repeating the call with the same
/// inputs fails the same way.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettlementError {
    #[error("unsupported bet type: {0}")]
    UnsupportedBetType(String),

    #[error("malformed {bet_type} selection: {reason}")]
    MalformedSelection { bet_type: String, reason: String },

    #[error("no odds data available: {0}")]
    MissingMarketData(String),

    #[error("team '{team}' is not playing in {away_team} @ {home_team}")]
    UnknownTeam {
        team: String,
        home_team: String,
        away_team: String,
    },

    #[error("game {0} has no final score")]
    GameNotFinal(String),

    #[error("stake must be positive, got {0}")]
    InvalidStake(i64),

    #[error("potential win cannot be negative, got {0}")]
    InvalidPotentialWin(i64),

    #[error("invalid American odds: {0}")]
    InvalidOdds(i32),

    #[error("amount overflows cents: {0}")]
    AmountOverflow(String),

    #[error("wager {id} is already {status}")]
    AlreadySettled { id: String, status: String },
}

/// Configuration errors surfaced while reading the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    MissingField(&'static str),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
