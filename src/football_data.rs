//! Client for the football-data.org v4 competitions API.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::FetchConfig;
use crate::error::PredictError;
use crate::http_client::http_client;
use crate::records::{MatchRecord, MatchStatus, Score, TeamRecord};

const AUTH_HEADER: &str = "X-Auth-Token";
const ERROR_BODY_LIMIT: usize = 300;

#[derive(Debug, Deserialize)]
struct StandingsResponse {
    #[serde(default)]
    standings: Vec<StandingsGroup>,
}

#[derive(Debug, Deserialize)]
struct StandingsGroup {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    table: Vec<StandingsEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StandingsEntry {
    position: u32,
    team: ApiTeam,
    played_games: u32,
    won: u32,
    draw: u32,
    lost: u32,
    points: i32,
    goals_for: i32,
    goals_against: i32,
    goal_difference: i32,
}

#[derive(Debug, Deserialize)]
struct ApiTeam {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MatchesResponse {
    #[serde(default)]
    matches: Vec<ApiMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMatch {
    utc_date: String,
    #[serde(default)]
    status: String,
    home_team: ApiTeam,
    away_team: ApiTeam,
    score: Option<ApiScore>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiScore {
    full_time: Option<ApiScoreLine>,
}

#[derive(Debug, Deserialize)]
struct ApiScoreLine {
    home: Option<u32>,
    away: Option<u32>,
}

/// Read-only access to one competition API, authenticated with a token header.
pub struct FootballDataClient {
    client: &'static Client,
    api_key: String,
    base_url: String,
}

impl FootballDataClient {
    pub fn new(cfg: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(cfg.timeout_secs)?,
            api_key: cfg.api_key.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn fetch_standings(&self, competition: &str, season: i32) -> Result<Vec<TeamRecord>> {
        let url = format!("{}/competitions/{competition}/standings", self.base_url);
        let body = self
            .get(&url, season)
            .with_context(|| format!("standings request for {competition} {season}"))?;
        let rows = parse_standings_json(&body)
            .with_context(|| format!("parse standings for {competition} {season}"))?;
        for row in &rows {
            if let Err(msg) = row.validate() {
                warn!("standings row fails invariant check: {msg}");
            }
        }
        info!(competition, season, teams = rows.len(), "fetched standings");
        Ok(rows)
    }

    pub fn fetch_matches(&self, competition: &str, season: i32) -> Result<Vec<MatchRecord>> {
        let url = format!("{}/competitions/{competition}/matches", self.base_url);
        let body = self
            .get(&url, season)
            .with_context(|| format!("matches request for {competition} {season}"))?;
        let rows = parse_matches_json(&body)
            .with_context(|| format!("parse matches for {competition} {season}"))?;
        info!(competition, season, matches = rows.len(), "fetched matches");
        Ok(rows)
    }

    fn get(&self, url: &str, season: i32) -> Result<String> {
        debug!(url, season, "GET");
        let resp = self
            .client
            .get(url)
            .header(AUTH_HEADER, &self.api_key)
            .query(&[("season", season)])
            .send()
            .context("request failed")?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(PredictError::Upstream {
                status: status.as_u16(),
                body: truncate_body(&body, ERROR_BODY_LIMIT),
            }
            .into());
        }
        Ok(body)
    }
}

/// Extracts the `TOTAL` standings table. Entries without a team name are skipped.
pub fn parse_standings_json(raw: &str) -> Result<Vec<TeamRecord>> {
    let resp: StandingsResponse = serde_json::from_str(raw).context("invalid standings json")?;
    let Some(group) = resp
        .standings
        .into_iter()
        .find(|g| g.kind.eq_ignore_ascii_case("TOTAL"))
    else {
        return Err(anyhow::anyhow!("standings response has no TOTAL table"));
    };

    Ok(group
        .table
        .into_iter()
        .filter_map(|e| {
            let team = e.team.name?.trim().to_string();
            if team.is_empty() {
                return None;
            }
            Some(TeamRecord {
                team,
                position: e.position,
                played: e.played_games,
                wins: e.won,
                draws: e.draw,
                losses: e.lost,
                goals_for: e.goals_for,
                goals_against: e.goals_against,
                goal_diff: e.goal_difference,
                points: e.points,
            })
        })
        .collect())
}

/// Flattens the fixtures list. A score is kept only when both sides are present.
pub fn parse_matches_json(raw: &str) -> Result<Vec<MatchRecord>> {
    let resp: MatchesResponse = serde_json::from_str(raw).context("invalid matches json")?;
    let mut out = Vec::with_capacity(resp.matches.len());
    for m in resp.matches {
        let (Some(home_team), Some(away_team)) = (m.home_team.name, m.away_team.name) else {
            // TBD knockout slots have null team names.
            continue;
        };
        let kickoff = DateTime::parse_from_rfc3339(&m.utc_date)
            .with_context(|| format!("invalid utcDate {:?}", m.utc_date))?
            .with_timezone(&Utc);
        let score = m
            .score
            .and_then(|s| s.full_time)
            .and_then(|ft| match (ft.home, ft.away) {
                (Some(home), Some(away)) => Some(Score { home, away }),
                _ => None,
            });
        out.push(MatchRecord {
            kickoff,
            home_team,
            away_team,
            score,
            status: MatchStatus::from_api(&m.status),
        });
    }
    Ok(out)
}

fn truncate_body(body: &str, limit: usize) -> String {
    match body.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
