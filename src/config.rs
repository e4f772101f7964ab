use crate::api::Sport;
use crate::error::ConfigError;
use crate::utils::fade::FadePricing;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

/// Runtime settings, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct Config {
    pub odds_api_key: Option<String>,
    pub sport: Sport,
    pub bookmaker: Option<String>,
    pub scores_days_from: u8,
    pub cache_dir: PathBuf,
    pub fade_pricing: FadePricing,
    pub bind_addr: String,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Install the global tracing subscriber. `RUST_LOG` wins over `level`.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => fmt().json().with_env_filter(filter).init(),
            _ => fmt().with_env_filter(filter).init(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let sport = match get("SPORT") {
            Some(s) => s.parse::<Sport>().map_err(|reason| ConfigError::InvalidValue {
                field: "SPORT",
                reason,
            })?,
            None => Sport::Nba,
        };

        let fade_pricing = match get("FADE_PRICING") {
            Some(s) => s.parse::<FadePricing>().map_err(|reason| ConfigError::InvalidValue {
                field: "FADE_PRICING",
                reason,
            })?,
            None => FadePricing::default(),
        };

        let scores_days_from = match get("SCORES_DAYS_FROM") {
            Some(s) => {
                let days: u8 = s.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "SCORES_DAYS_FROM",
                    reason: format!("'{}' is not a number", s),
                })?;
                if !(1..=3).contains(&days) {
                    return Err(ConfigError::InvalidValue {
                        field: "SCORES_DAYS_FROM",
                        reason: format!("{} is outside 1-3", days),
                    });
                }
                days
            }
            None => 3,
        };

        let defaults = LoggingConfig::default();

        Ok(Self {
            odds_api_key: get("ODDS_API_KEY"),
            sport,
            bookmaker: get("BOOKMAKER"),
            scores_days_from,
            cache_dir: get("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("cache")),
            fade_pricing,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3000".to_string()),
            logging: LoggingConfig {
                level: get("LOG_LEVEL").unwrap_or(defaults.level),
                format: get("LOG_FORMAT").unwrap_or(defaults.format),
            },
        })
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.odds_api_key
            .as_deref()
            .ok_or(ConfigError::MissingField("ODDS_API_KEY"))
    }

    pub fn games_cache_file(&self) -> PathBuf {
        self.cache_dir.join("games.json")
    }

    pub fn scores_cache_file(&self) -> PathBuf {
        self.cache_dir.join("scores.json")
    }
}
