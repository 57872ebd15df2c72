//! Football match outcome prediction from team form
//!
//! Derives rolling form summaries from historical match results and feeds
//! them to a softmax classifier over {home win, draw, away win}.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod serve;
pub mod training;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single normalized match result.
///
/// Team names are canonical (alias-resolved); events for a league are kept
/// in chronological order, ties broken by input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
}

impl MatchEvent {
    /// Full-time result from the home side's perspective.
    pub fn result(&self) -> MatchResult {
        MatchResult::from_goals(self.home_goals, self.away_goals)
    }
}

/// Full-time outcome of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Home,
    Draw,
    Away,
}

impl MatchResult {
    pub fn from_goals(home_goals: u32, away_goals: u32) -> Self {
        match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => MatchResult::Home,
            std::cmp::Ordering::Equal => MatchResult::Draw,
            std::cmp::Ordering::Less => MatchResult::Away,
        }
    }

    /// League points awarded to a team that scored `goals_for` against
    /// `goals_against`.
    pub fn points(goals_for: u32, goals_against: u32) -> u8 {
        match goals_for.cmp(&goals_against) {
            std::cmp::Ordering::Greater => 3,
            std::cmp::Ordering::Equal => 1,
            std::cmp::Ordering::Less => 0,
        }
    }

    /// Class index used for training targets. Must agree with
    /// [`model::labels::LabelDecoder::canonical`].
    pub fn class_index(&self) -> usize {
        match self {
            MatchResult::Home => 0,
            MatchResult::Draw => 1,
            MatchResult::Away => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchResult::Home => "home",
            MatchResult::Draw => "draw",
            MatchResult::Away => "away",
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum FootyError {
    #[error("No column matching required field '{field}'")]
    ColumnNotFound { field: &'static str },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Feature contract mismatch: {0}")]
    FeatureContract(String),

    #[error("No trained model for league '{0}' - run `footy train` first")]
    NoModel(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, FootyError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub form: FormConfig,
    pub training: TrainingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root folder holding one subdirectory of CSV files per league
    pub data_dir: String,
    /// Root folder for persisted per-league model bundles
    pub model_dir: String,
    /// Parse ambiguous dates day-first (e.g. 05/01/2024 = 5 January)
    pub dayfirst: bool,
    /// League assumed when a request names none
    pub default_league: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    /// Trailing window size for team form
    pub window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    /// Fraction of the (chronological) tail held out for validation
    pub validation_split: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                data_dir: "data".to_string(),
                model_dir: "model".to_string(),
                dayfirst: true,
                default_league: "premier".to_string(),
            },
            form: FormConfig { window: 5 },
            training: TrainingConfig {
                epochs: 200,
                learning_rate: 0.1,
                validation_split: 0.2,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FootyError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| FootyError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FootyError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_from_goals() {
        assert_eq!(MatchResult::from_goals(2, 0), MatchResult::Home);
        assert_eq!(MatchResult::from_goals(1, 1), MatchResult::Draw);
        assert_eq!(MatchResult::from_goals(0, 3), MatchResult::Away);
    }

    #[test]
    fn test_points() {
        assert_eq!(MatchResult::points(2, 0), 3);
        assert_eq!(MatchResult::points(1, 1), 1);
        assert_eq!(MatchResult::points(0, 2), 0);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.form.window, 5);
        assert_eq!(back.data.default_league, "premier");
    }
}
