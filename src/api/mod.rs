pub mod odds_api;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sports the odds board and scores are fetched for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sport {
    Nba,
    Nfl,
    Mlb,
    Nhl,
    CollegeFootball,
    CollegeBasketball,
}

impl Sport {
    /// The Odds API sport key
    pub fn key(&self) -> &'static str {
        match self {
            Sport::Nba => "basketball_nba",
            Sport::Nfl => "americanfootball_nfl",
            Sport::Mlb => "baseball_mlb",
            Sport::Nhl => "icehockey_nhl",
            Sport::CollegeFootball => "americanfootball_ncaaf",
            Sport::CollegeBasketball => "basketball_ncaab",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Sport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nba" | "basketball_nba" => Ok(Sport::Nba),
            "nfl" | "americanfootball_nfl" => Ok(Sport::Nfl),
            "mlb" | "baseball_mlb" => Ok(Sport::Mlb),
            "nhl" | "icehockey_nhl" => Ok(Sport::Nhl),
            "ncaaf" | "cfb" | "americanfootball_ncaaf" => Ok(Sport::CollegeFootball),
            "ncaab" | "cbb" | "basketball_ncaab" => Ok(Sport::CollegeBasketball),
            other => Err(format!("unknown sport '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sport_from_str() {
        assert_eq!("nba".parse::<Sport>().unwrap(), Sport::Nba);
        assert_eq!("CFB".parse::<Sport>().unwrap(), Sport::CollegeFootball);
        assert_eq!(
            "basketball_ncaab".parse::<Sport>().unwrap(),
            Sport::CollegeBasketball
        );
        assert!("cricket".parse::<Sport>().is_err());
        assert_eq!(Sport::Nfl.to_string(), "americanfootball_nfl");
    }
}
