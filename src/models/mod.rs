pub mod wager;

pub use wager::*;

use crate::error::SettlementError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of a game a team is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

/// A game, its odds board, and its final score once completed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commence_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odds_market: Option<OddsMarket>,
}

impl Game {
    pub fn new(
        id: impl Into<String>,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            home_team: home_team.into(),
            away_team: away_team.into(),
            commence_time: None,
            completed: false,
            home_score: None,
            away_score: None,
            odds_market: None,
        }
    }

    /// Mark the game final with the given score
    pub fn with_score(mut self, home_score: u32, away_score: u32) -> Self {
        self.home_score = Some(home_score);
        self.away_score = Some(away_score);
        self.completed = true;
        self
    }

    pub fn with_market(mut self, market: OddsMarket) -> Self {
        self.odds_market = Some(market);
        self
    }

    /// Resolve a team name to its side by exact name match
    pub fn side_of(&self, team: &str) -> Result<Side, SettlementError> {
        if team == self.home_team {
            Ok(Side::Home)
        } else if team == self.away_team {
            Ok(Side::Away)
        } else {
            Err(SettlementError::UnknownTeam {
                team: team.to_string(),
                home_team: self.home_team.clone(),
                away_team: self.away_team.clone(),
            })
        }
    }

    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    /// (home, away) score, or `GameNotFinal` if either is missing
    pub fn final_score(&self) -> Result<(u32, u32), SettlementError> {
        match (self.home_score, self.away_score) {
            (Some(home), Some(away)) => Ok((home, away)),
            _ => Err(SettlementError::GameNotFinal(self.id.clone())),
        }
    }
}

/// Odds board for a game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsMarket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h2h: Option<H2hOdds>,
    #[serde(default)]
    pub spreads: Vec<SpreadOdds>,
    #[serde(default)]
    pub totals: Vec<TotalOdds>,
}

impl OddsMarket {
    pub fn spread_price(&self, team: &str, point: f64) -> Option<i32> {
        self.spreads
            .iter()
            .find(|s| s.team == team && s.point == point)
            .map(|s| s.price)
    }

    pub fn total_price(&self, total_type: TotalType, point: f64) -> Option<i32> {
        self.totals
            .iter()
            .find(|t| t.total_type == total_type && t.point == point)
            .map(|t| t.price)
    }
}

/// Moneyline prices, American odds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct H2hOdds {
    pub home: i32,
    pub away: i32,
}

impl H2hOdds {
    pub fn price(&self, side: Side) -> i32 {
        match side {
            Side::Home => self.home,
            Side::Away => self.away,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadOdds {
    pub team: String,
    pub point: f64,
    pub price: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalOdds {
    pub total_type: TotalType,
    pub point: f64,
    pub price: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_of_requires_exact_team_name() {
        let game = Game::new("g1", "Lakers", "Celtics");
        assert_eq!(game.side_of("Lakers").unwrap(), Side::Home);
        assert_eq!(game.side_of("Celtics").unwrap(), Side::Away);

        // No fuzzy matching on partial names or the word "home"
        assert!(matches!(
            game.side_of("home"),
            Err(SettlementError::UnknownTeam { .. })
        ));
        assert!(game.side_of("Los Angeles Lakers").is_err());
    }

    #[test]
    fn test_final_score() {
        let game = Game::new("g1", "Lakers", "Celtics");
        assert_eq!(
            game.final_score().unwrap_err(),
            SettlementError::GameNotFinal("g1".to_string())
        );

        let game = game.with_score(101, 99);
        assert_eq!(game.final_score().unwrap(), (101, 99));
        assert!(game.completed);
    }

    #[test]
    fn test_game_deserializes_from_camel_case() {
        let json = r#"{
            "id": "g9",
            "homeTeam": "Lakers",
            "awayTeam": "Celtics",
            "homeScore": 110,
            "awayScore": 104,
            "oddsMarket": {
                "h2h": {"home": -150, "away": 130},
                "spreads": [{"team": "Lakers", "point": -3.5, "price": -110}],
                "totals": [{"totalType": "over", "point": 221.5, "price": -105}]
            }
        }"#;
        let game: Game = serde_json::from_str(json).unwrap();
        assert_eq!(game.final_score().unwrap(), (110, 104));

        let market = game.odds_market.unwrap();
        assert_eq!(market.h2h.unwrap().price(Side::Away), 130);
        assert_eq!(market.spread_price("Lakers", -3.5), Some(-110));
        assert_eq!(market.total_price(TotalType::Over, 221.5), Some(-105));
        assert_eq!(market.total_price(TotalType::Under, 221.5), None);
    }
}
