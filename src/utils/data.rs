use crate::error::SettlementError;
use crate::models::{Wager, WagerRecord};
use crate::utils::settlement::{SettlementFailure, SettlementRecord};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::warn;

/// Save any serializable value to a pretty JSON file, creating parent dirs
pub fn save_to_cache<T: Serialize + ?Sized>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("Failed to serialize data")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write cache file {}", path.display()))?;
    Ok(())
}

/// Load a JSON file written by `save_to_cache` or exported by the backend
pub fn load_from_cache<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cache file {}", path.display()))?;
    let value = serde_json::from_str(&json)
        .with_context(|| format!("Failed to deserialize {}", path.display()))?;
    Ok(value)
}

/// Wagers read from a file, split into valid ones and records that failed
/// validation
#[derive(Debug, Default)]
pub struct LoadedWagers {
    pub wagers: Vec<Wager>,
    pub rejected: Vec<SettlementFailure>,
}

impl LoadedWagers {
    /// Find a wager by id. A rejected record with that id yields its
    /// validation error.
    pub fn find(&self, id: &str) -> Option<Result<&Wager, &SettlementError>> {
        if let Some(wager) = self.wagers.iter().find(|w| w.id == id) {
            return Some(Ok(wager));
        }
        self.rejected
            .iter()
            .find(|f| f.wager_id == id)
            .map(|f| Err(&f.error))
    }
}

/// Load wager records. Records that fail validation are returned in
/// `rejected` with their error.
pub fn load_wagers(path: impl AsRef<Path>) -> Result<LoadedWagers> {
    let records: Vec<WagerRecord> = load_from_cache(path)?;

    let mut loaded = LoadedWagers::default();
    for record in records {
        let wager_id = record.id.clone();
        match Wager::try_from(record) {
            Ok(wager) => loaded.wagers.push(wager),
            Err(error) => {
                warn!(wager_id = %wager_id, error = %error, "rejecting malformed wager");
                loaded.rejected.push(SettlementFailure { wager_id, error });
            }
        }
    }
    Ok(loaded)
}

#[derive(Serialize)]
struct SettlementRow<'a> {
    wager_id: &'a str,
    game_id: &'a str,
    status: crate::models::OutcomeStatus,
    stake: i64,
    win_amount: i64,
    bankroll_credit: i64,
    settled_at: String,
}

/// Save settlement records to CSV
pub fn save_settlements_to_csv(records: &[SettlementRecord], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;

    for record in records {
        writer.serialize(SettlementRow {
            wager_id: &record.wager_id,
            game_id: &record.game_id,
            status: record.status,
            stake: record.stake,
            win_amount: record.win_amount,
            bankroll_credit: record.bankroll_credit()?,
            settled_at: record.settled_at.to_rfc3339(),
        })?;
    }

    writer.flush().context("Failed to flush CSV file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Game, OutcomeStatus, WagerStatus};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("games.json");

        let games = vec![Game::new("g1", "Lakers", "Celtics").with_score(99, 98)];
        save_to_cache(&games, &path).unwrap();

        let loaded: Vec<Game> = load_from_cache(&path).unwrap();
        assert_eq!(loaded, games);
    }

    #[test]
    fn test_load_wagers_returns_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wagers.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "w1", "gameId": "g1", "betType": "spread",
                 "selection": {"team": "Lakers", "line": -4.5},
                 "stake": 1000, "odds": -110, "potentialWin": 909, "status": "pending"},
                {"id": "w2", "gameId": "g1", "betType": "teaser",
                 "selection": {"team": "Lakers"},
                 "stake": 1000, "odds": -110, "potentialWin": 909},
                {"id": "w3", "gameId": "g1", "betType": "total",
                 "selection": {"line": 220.5},
                 "stake": 1000, "odds": -110, "potentialWin": 909}
            ]"#,
        )
        .unwrap();

        let loaded = load_wagers(&path).unwrap();
        assert_eq!(loaded.wagers.len(), 1);
        assert_eq!(loaded.wagers[0].id, "w1");
        assert_eq!(loaded.wagers[0].status(), WagerStatus::Pending);

        assert_eq!(loaded.rejected.len(), 2);
        assert_eq!(
            loaded.rejected[0].error,
            SettlementError::UnsupportedBetType("teaser".to_string())
        );
        assert_eq!(loaded.rejected[1].wager_id, "w3");
        assert!(matches!(
            loaded.rejected[1].error,
            SettlementError::MalformedSelection { .. }
        ));
    }

    #[test]
    fn test_find_reports_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wagers.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "w1", "gameId": "g1", "betType": "moneyline",
                 "selection": {"team": "Lakers"},
                 "stake": 1000, "odds": 120, "potentialWin": 1200},
                {"id": "w9", "gameId": "g1", "betType": "spread",
                 "selection": {"team": "Lakers"},
                 "stake": 1000, "odds": -110, "potentialWin": 909}
            ]"#,
        )
        .unwrap();

        let loaded = load_wagers(&path).unwrap();
        assert_eq!(loaded.find("w1").unwrap().unwrap().id, "w1");
        assert!(matches!(
            loaded.find("w9"),
            Some(Err(SettlementError::MalformedSelection { .. }))
        ));
        assert!(loaded.find("w404").is_none());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<Vec<Game>> = load_from_cache(dir.path().join("missing.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_save_settlements_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settlements.csv");
        let records = vec![SettlementRecord {
            wager_id: "w1".to_string(),
            game_id: "g1".to_string(),
            status: OutcomeStatus::Won,
            stake: 1000,
            win_amount: 909,
            settled_at: Utc.with_ymd_and_hms(2026, 1, 15, 4, 30, 0).unwrap(),
        }];

        save_settlements_to_csv(&records, &path).unwrap();
        let csv = std::fs::read_to_string(&path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "wager_id,game_id,status,stake,win_amount,bankroll_credit,settled_at"
        );
        assert_eq!(
            lines.next().unwrap(),
            "w1,g1,won,1000,909,1909,2026-01-15T04:30:00+00:00"
        );
    }
}
