//! Boxer profile ingestion and matchup prediction
//!
//! Scrapes encyclopedia profile pages into a relational store of athletes,
//! bouts and ranking metrics, then predicts hypothetical matchups with an
//! Elo-style rating built from aggregate career statistics.

pub mod data;
pub mod ingest;
pub mod normalize;
pub mod predict;
pub mod report;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unique identifier for an athlete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AthleteId(pub i64);

impl fmt::Display for AthleteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Athlete({})", self.0)
    }
}

/// Unique identifier for a bout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoutId(pub i64);

impl fmt::Display for BoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bout({})", self.0)
    }
}

/// Fighting stance as listed in the profile infobox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stance {
    Orthodox,
    Southpaw,
    Switch,
}

impl Stance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::Orthodox => "Orthodox",
            Stance::Southpaw => "Southpaw",
            Stance::Switch => "Switch",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "orthodox" => Some(Stance::Orthodox),
            "southpaw" => Some(Stance::Southpaw),
            "switch" => Some(Stance::Switch),
            _ => None,
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical outcome method for a bout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodCode {
    #[serde(rename = "KO")]
    Ko,
    #[serde(rename = "TKO")]
    Tko,
    Decision,
    Draw,
    #[serde(rename = "DQ")]
    Dq,
    #[serde(rename = "NC")]
    Nc,
    #[serde(rename = "unknown")]
    Unknown,
}

impl MethodCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodCode::Ko => "KO",
            MethodCode::Tko => "TKO",
            MethodCode::Decision => "Decision",
            MethodCode::Draw => "Draw",
            MethodCode::Dq => "DQ",
            MethodCode::Nc => "NC",
            MethodCode::Unknown => "unknown",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "KO" => Some(MethodCode::Ko),
            "TKO" => Some(MethodCode::Tko),
            "Decision" => Some(MethodCode::Decision),
            "Draw" => Some(MethodCode::Draw),
            "DQ" => Some(MethodCode::Dq),
            "NC" => Some(MethodCode::Nc),
            "unknown" => Some(MethodCode::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for MethodCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted athlete with biographical and physical attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Athlete {
    pub id: AthleteId,
    pub name: String,
    pub alias: Option<String>,
    pub portrait: String,
    pub stance: Option<Stance>,
    pub height_cm: Option<u32>,
    pub reach_cm: Option<u32>,
    pub birth_date: Option<NaiveDate>,
    pub active_from: Option<NaiveDate>,
    pub active_to: Option<NaiveDate>,
    pub eras: Vec<String>,
}

/// Resolution state of a bout's identity references
///
/// References only move forward through these states. The resolver is the
/// sole transition function and never reverts a reference once set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Unresolved,
    PartiallyResolved,
    Resolved,
}

/// A persisted bout between two athletes
///
/// Side A is always the profile owner the bout was ingested from. The
/// opponent and winner references may be unset when the referenced athlete
/// had not been ingested yet; their name strings are kept so a later
/// resolver pass can repair them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoutRecord {
    pub id: BoutId,
    pub athlete_a: AthleteId,
    pub athlete_b: Option<AthleteId>,
    pub winner: Option<AthleteId>,
    pub opponent_name: String,
    pub winner_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub round_time: Option<String>,
    pub location: Option<String>,
    pub title_bout: bool,
    pub method: MethodCode,
}

impl BoutRecord {
    pub fn resolution(&self) -> ResolutionState {
        match (self.athlete_b, self.winner) {
            (Some(_), Some(_)) => ResolutionState::Resolved,
            (None, None) => ResolutionState::Unresolved,
            _ => ResolutionState::PartiallyResolved,
        }
    }
}

/// Aggregate career statistics for one athlete
///
/// Created once alongside the athlete at first ingestion and never updated
/// by this crate afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankingMetrics {
    pub fights: u32,
    pub wins: u32,
    pub losses: u32,
    pub wins_by_ko: u32,
    pub wins_by_decision: u32,
    pub wins_by_dq: u32,
    pub losses_by_ko: u32,
    pub losses_by_decision: u32,
    pub losses_by_dq: u32,
    pub win_ratio: f64,
    pub ko_ratio: f64,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum RingsideError {
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Page has no recognizable profile")]
    NoProfile,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Athlete not found with ID: {0}")]
    AthleteNotFound(AthleteId),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, RingsideError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub scrape: ScrapeConfig,
    pub resolve: ResolveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
    pub urls_path: String,
    pub unresolved_opponents_log: String,
    pub unresolved_winners_log: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub timeout_secs: u64,
    pub delay_ms: u64,
    pub user_agent: String,
    pub default_portrait: String,
    pub category_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    pub batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                database_path: "data/ringside.db".to_string(),
                urls_path: "data/urls.txt".to_string(),
                unresolved_opponents_log: "data/unresolved_opponents.log".to_string(),
                unresolved_winners_log: "data/unresolved_winners.log".to_string(),
            },
            scrape: ScrapeConfig {
                timeout_secs: 10,
                delay_ms: 1000,
                user_agent: "ringside/0.1".to_string(),
                default_portrait:
                    "https://www.nicepng.com/png/detail/272-2725101_silhouette-fighter.png"
                        .to_string(),
                category_url: "https://en.wikipedia.org/wiki/Category:Heavyweight_boxers"
                    .to_string(),
            },
            resolve: ResolveConfig { batch_size: 500 },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RingsideError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| RingsideError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RingsideError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stance_parse() {
        assert_eq!(Stance::parse("ORTHODOX"), Some(Stance::Orthodox));
        assert_eq!(Stance::parse("southpaw"), Some(Stance::Southpaw));
        assert_eq!(Stance::parse("crab"), None);
    }

    #[test]
    fn test_method_code_roundtrip() {
        for code in ["KO", "TKO", "Decision", "Draw", "DQ", "NC", "unknown"] {
            let method = MethodCode::from_code(code).unwrap();
            assert_eq!(method.as_str(), code);
        }
        assert_eq!(MethodCode::from_code("SUBMISSION"), None);
    }

    #[test]
    fn test_resolution_state() {
        let mut bout = BoutRecord {
            id: BoutId(1),
            athlete_a: AthleteId(1),
            athlete_b: None,
            winner: None,
            opponent_name: "Joe Frazier".to_string(),
            winner_name: Some("Joe Frazier".to_string()),
            date: None,
            round_time: None,
            location: None,
            title_bout: false,
            method: MethodCode::Unknown,
        };
        assert_eq!(bout.resolution(), ResolutionState::Unresolved);

        bout.athlete_b = Some(AthleteId(2));
        assert_eq!(bout.resolution(), ResolutionState::PartiallyResolved);

        bout.winner = Some(AthleteId(2));
        assert_eq!(bout.resolution(), ResolutionState::Resolved);
    }

    #[test]
    fn test_default_config_roundtrip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.resolve.batch_size, 500);
        assert_eq!(parsed.scrape.timeout_secs, 10);
    }
}
