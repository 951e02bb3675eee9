use std::env;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate, Utc};

use crate::error::{PredictError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.football-data.org/v4";
pub const DEFAULT_COMPETITION: &str = "PL";
pub const DEFAULT_LOWER_DIVISION: &str = "ELC";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Paths of the persisted tables and model artifacts.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub team_stats: PathBuf,
    pub team_form: PathBuf,
    pub model: PathBuf,
    pub label_encoder: PathBuf,
    pub model_classes: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            team_stats: PathBuf::from("data/pl_team_stats.csv"),
            team_form: PathBuf::from("data/pl_team_form.csv"),
            model: PathBuf::from("models/team_model.json"),
            label_encoder: PathBuf::from("models/label_encoder.json"),
            model_classes: PathBuf::from("model_classes.json"),
        }
    }
}

impl DataPaths {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            team_stats: env_path("TEAM_STATS_PATH").unwrap_or(d.team_stats),
            team_form: env_path("TEAM_FORM_PATH").unwrap_or(d.team_form),
            model: env_path("MODEL_PATH").unwrap_or(d.model),
            label_encoder: env_path("LABEL_ENCODER_PATH").unwrap_or(d.label_encoder),
            model_classes: env_path("MODEL_CLASSES_PATH").unwrap_or(d.model_classes),
        }
    }
}

/// Settings for the data-refresh job.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub api_key: String,
    pub base_url: String,
    pub competition: String,
    pub lower_division: String,
    pub season: i32,
    pub timeout_secs: u64,
}

impl FetchConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = env_string("FOOTBALL_DATA_API_KEY")
            .or_else(|| env_string("FOOTBALL_API_KEY"))
            .ok_or_else(|| {
                PredictError::Config("missing FOOTBALL_DATA_API_KEY environment variable".into())
            })?;
        let season = match env_string("PL_SEASON") {
            Some(raw) => raw
                .parse::<i32>()
                .map_err(|_| PredictError::Config(format!("PL_SEASON is not a year: {raw}")))?,
            None => season_start(Utc::now().date_naive()),
        };
        Ok(Self {
            api_key,
            base_url: env_string("FOOTBALL_DATA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            competition: env_string("PL_COMPETITION")
                .unwrap_or_else(|| DEFAULT_COMPETITION.to_string()),
            lower_division: env_string("LOWER_DIVISION_COMPETITION")
                .unwrap_or_else(|| DEFAULT_LOWER_DIVISION.to_string()),
            season,
            timeout_secs: env_string("HTTP_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS)
                .max(1),
        })
    }
}

/// Starting year of the season `today` falls in. Seasons roll over in July.
pub fn season_start(today: NaiveDate) -> i32 {
    if today.month() >= 7 {
        today.year()
    } else {
        today.year() - 1
    }
}

/// Loads `.env.local` then `.env`; neither is required.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env_string(key).map(PathBuf::from)
}

/// Reads `--name value` or `--name=value` from the process arguments.
pub fn arg_value(name: &str) -> Option<String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    arg_value_from(&args, name)
}

fn arg_value_from(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(v) = arg.strip_prefix(&prefix) {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_rolls_over_in_july() {
        let june = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let july = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        assert_eq!(season_start(june), 2024);
        assert_eq!(season_start(july), 2025);
    }

    #[test]
    fn arg_value_accepts_both_forms() {
        let args = vec![
            "--out=models/x.json".to_string(),
            "--season".to_string(),
            "2023".to_string(),
        ];
        assert_eq!(
            arg_value_from(&args, "--out").as_deref(),
            Some("models/x.json")
        );
        assert_eq!(arg_value_from(&args, "--season").as_deref(), Some("2023"));
        assert_eq!(arg_value_from(&args, "--missing"), None);
    }
}
