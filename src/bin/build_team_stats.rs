use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use pl_predictor::config::{self, DataPaths, FetchConfig};
use pl_predictor::football_data::FootballDataClient;
use pl_predictor::strength_table::StrengthTable;
use pl_predictor::team_strength::{PriorSeason, build_team_strength};
use pl_predictor::logging;

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init();

    let mut cfg = FetchConfig::from_env()?;
    if let Some(raw) = config::arg_value("--season") {
        cfg.season = raw
            .parse()
            .with_context(|| format!("--season is not a year: {raw}"))?;
    }
    let mut paths = DataPaths::from_env();
    if let Some(p) = config::arg_value("--stats-out") {
        paths.team_stats = PathBuf::from(p);
    }
    if let Some(p) = config::arg_value("--form-out") {
        paths.team_form = PathBuf::from(p);
    }

    let api = FootballDataClient::new(&cfg)?;
    let season = cfg.season;
    let prior = season - 1;

    // Everything is fetched before any file is touched.
    let standings = api.fetch_standings(&cfg.competition, season)?;
    let matches = api.fetch_matches(&cfg.competition, season)?;
    let prior_standings = api.fetch_standings(&cfg.competition, prior)?;
    let prior_matches = api.fetch_matches(&cfg.competition, prior)?;
    let lower_matches = api.fetch_matches(&cfg.lower_division, prior)?;

    let prior_teams = prior_standings
        .iter()
        .map(|r| r.team.clone())
        .collect::<HashSet<_>>();
    let promoted = standings
        .iter()
        .filter(|r| !prior_teams.contains(&r.team))
        .map(|r| r.team.as_str())
        .collect::<Vec<_>>();
    info!(?promoted, "teams using lower-division prior season");

    let rows = build_team_strength(
        &standings,
        &matches,
        PriorSeason {
            top_flight_teams: &prior_teams,
            top_flight_matches: &prior_matches,
            lower_division_matches: &lower_matches,
        },
    );
    let table = StrengthTable::from_rows(rows)?;
    table.save(&paths.team_stats, &paths.team_form)?;

    println!("Team strength table written");
    println!("Season: {}", season_label(season));
    println!("Teams: {}", table.len());
    println!("Stats: {}", paths.team_stats.display());
    println!("Form: {}", paths.team_form.display());
    Ok(())
}

fn season_label(start: i32) -> String {
    format!("{start}/{:02}", (start + 1) % 100)
}
