//! Per-team aggregate and recent-form features derived from standings and fixtures.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::records::{MatchRecord, TeamRecord};

pub const FORM_WINDOW: usize = 5;
pub const PRIOR_SEASON_WEIGHT: f64 = 0.5;
const RATING_POINTS_WEIGHT: f64 = 0.5;
const RATING_GOAL_DIFF_WEIGHT: f64 = 0.5;
const OPPONENT_HOME_BONUS: f64 = 5.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VenueRecord {
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

impl VenueRecord {
    pub fn played(&self) -> u32 {
        self.wins + self.draws + self.losses
    }

    fn push(&mut self, result: i8) {
        match result {
            1 => self.wins += 1,
            0 => self.draws += 1,
            _ => self.losses += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HomeAwaySplit {
    pub home: VenueRecord,
    pub away: VenueRecord,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecentForm {
    /// Oldest first.
    pub results: Vec<i8>,
    pub total: i32,
    pub weighted: f64,
}

/// Prior-season match history used for the weighted home/away record.
#[derive(Debug, Clone, Copy)]
pub struct PriorSeason<'a> {
    /// Teams that played the prior season in the same competition.
    pub top_flight_teams: &'a HashSet<String>,
    pub top_flight_matches: &'a [MatchRecord],
    /// Prior season of the division promoted teams come from.
    pub lower_division_matches: &'a [MatchRecord],
}

impl<'a> PriorSeason<'a> {
    pub fn matches_for(&self, team: &str) -> &'a [MatchRecord] {
        if self.top_flight_teams.contains(team) {
            self.top_flight_matches
        } else {
            self.lower_division_matches
        }
    }
}

/// One persisted row per team.
///
/// `form_last_5` is stored in its own table, so it is skipped by serde here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStrengthRow {
    pub team: String,
    pub position: u32,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_diff: i32,
    pub points: i32,
    pub home_wins: u32,
    pub home_draws: u32,
    pub home_losses: u32,
    pub away_wins: u32,
    pub away_draws: u32,
    pub away_losses: u32,
    pub weighted_home_wins: f64,
    pub weighted_home_draws: f64,
    pub weighted_home_losses: f64,
    pub weighted_away_wins: f64,
    pub weighted_away_draws: f64,
    pub weighted_away_losses: f64,
    pub form_total: i32,
    pub strength_weighted_form: f64,
    #[serde(skip)]
    pub form_last_5: Vec<i8>,
}

impl TeamStrengthRow {
    fn from_parts(
        base: &TeamRecord,
        current: HomeAwaySplit,
        prior: HomeAwaySplit,
        form: RecentForm,
    ) -> Self {
        let w = |now: u32, before: u32| now as f64 + PRIOR_SEASON_WEIGHT * before as f64;
        Self {
            team: base.team.clone(),
            position: base.position,
            played: base.played,
            wins: base.wins,
            draws: base.draws,
            losses: base.losses,
            goals_for: base.goals_for,
            goals_against: base.goals_against,
            goal_diff: base.goal_diff,
            points: base.points,
            home_wins: current.home.wins,
            home_draws: current.home.draws,
            home_losses: current.home.losses,
            away_wins: current.away.wins,
            away_draws: current.away.draws,
            away_losses: current.away.losses,
            weighted_home_wins: w(current.home.wins, prior.home.wins),
            weighted_home_draws: w(current.home.draws, prior.home.draws),
            weighted_home_losses: w(current.home.losses, prior.home.losses),
            weighted_away_wins: w(current.away.wins, prior.away.wins),
            weighted_away_draws: w(current.away.draws, prior.away.draws),
            weighted_away_losses: w(current.away.losses, prior.away.losses),
            form_total: form.total,
            strength_weighted_form: form.weighted,
            form_last_5: form.results,
        }
    }
}

/// Builds one row per team in `standings`, sorted by team name.
///
/// Teams with no scored matches get zero splits and an empty form.
pub fn build_team_strength(
    standings: &[TeamRecord],
    this_season: &[MatchRecord],
    prior: PriorSeason<'_>,
) -> Vec<TeamStrengthRow> {
    let by_name: HashMap<&str, &TeamRecord> =
        standings.iter().map(|r| (r.team.as_str(), r)).collect();

    let mut teams = standings.iter().collect::<Vec<_>>();
    teams.sort_by(|a, b| a.team.cmp(&b.team));
    teams.dedup_by(|a, b| a.team == b.team);

    teams
        .into_iter()
        .map(|base| {
            let current = home_away_split(this_season, &base.team);
            let previous = home_away_split(prior.matches_for(&base.team), &base.team);
            let form = recent_form(this_season, &base.team, &by_name);
            TeamStrengthRow::from_parts(base, current, previous, form)
        })
        .collect()
}

/// Counts results at home and away over matches with a final score.
pub fn home_away_split(matches: &[MatchRecord], team: &str) -> HomeAwaySplit {
    let mut out = HomeAwaySplit::default();
    for m in matches {
        let Some(result) = m.result_for(team) else {
            continue;
        };
        if m.home_team == team {
            out.home.push(result);
        } else {
            out.away.push(result);
        }
    }
    out
}

/// Results of the last `FORM_WINDOW` scored matches, oldest first, with the
/// strength-weighted sum.
///
/// Opponent strength is read from `standings` as it stands at build time, not
/// from a snapshot taken before each match.
pub fn recent_form(
    matches: &[MatchRecord],
    team: &str,
    standings: &HashMap<&str, &TeamRecord>,
) -> RecentForm {
    let mut played = matches
        .iter()
        .filter(|m| m.involves(team) && m.score.is_some())
        .collect::<Vec<_>>();
    played.sort_by_key(|m| m.kickoff);
    let start = played.len().saturating_sub(FORM_WINDOW);

    let mut out = RecentForm::default();
    for m in &played[start..] {
        let Some(result) = m.result_for(team) else {
            continue;
        };
        let Some(opponent) = m.opponent_of(team) else {
            continue;
        };
        let rating = opponent_rating(
            standings.get(opponent).copied(),
            m.home_team == opponent,
        );
        out.results.push(result);
        out.total += result as i32;
        out.weighted += result as f64 * rating;
    }
    out
}

/// `0.5 * points + 0.5 * goal_diff`, plus a bonus when the opponent hosted.
/// An opponent missing from the standings rates 0 before the bonus.
pub fn opponent_rating(opponent: Option<&TeamRecord>, opponent_at_home: bool) -> f64 {
    let base = opponent
        .map(|r| RATING_POINTS_WEIGHT * r.points as f64 + RATING_GOAL_DIFF_WEIGHT * r.goal_diff as f64)
        .unwrap_or(0.0);
    if opponent_at_home {
        base + OPPONENT_HOME_BONUS
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{MatchStatus, Score};
    use chrono::{Duration, TimeZone, Utc};

    fn record(team: &str, points: i32, goal_diff: i32) -> TeamRecord {
        TeamRecord {
            team: team.to_string(),
            position: 1,
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: goal_diff.max(0),
            goals_against: (-goal_diff).max(0),
            goal_diff,
            points,
        }
    }

    fn played(day: i64, home: &str, away: &str, hs: u32, as_: u32) -> MatchRecord {
        MatchRecord {
            kickoff: Utc.with_ymd_and_hms(2024, 8, 1, 15, 0, 0).unwrap() + Duration::days(day),
            home_team: home.to_string(),
            away_team: away.to_string(),
            score: Some(Score { home: hs, away: as_ }),
            status: MatchStatus::Finished,
        }
    }

    #[test]
    fn opponent_rating_adds_home_bonus() {
        let r = record("B", 30, 10);
        assert_eq!(opponent_rating(Some(&r), false), 20.0);
        assert_eq!(opponent_rating(Some(&r), true), 25.0);
        assert_eq!(opponent_rating(None, true), 5.0);
    }

    #[test]
    fn weighted_form_uses_current_standings() {
        let standings = vec![record("A", 10, 2), record("B", 30, 10)];
        let by_name = standings.iter().map(|r| (r.team.as_str(), r)).collect();
        // A wins away at B (rating 20 + 5), then loses at home to B (rating 20).
        let matches = vec![played(0, "B", "A", 0, 1), played(7, "A", "B", 0, 2)];
        let form = recent_form(&matches, "A", &by_name);
        assert_eq!(form.results, vec![1, -1]);
        assert_eq!(form.total, 0);
        assert!((form.weighted - 5.0).abs() < 1e-12);
    }

    #[test]
    fn form_keeps_last_five_in_chronological_order() {
        let standings = vec![record("A", 0, 0), record("B", 0, 0)];
        let by_name = standings.iter().map(|r| (r.team.as_str(), r)).collect();
        // Deliberately out of order; day 0 is the oldest and must drop out.
        let matches = vec![
            played(5, "A", "B", 0, 1),
            played(0, "A", "B", 3, 0),
            played(1, "A", "B", 1, 1),
            played(3, "B", "A", 0, 2),
            played(2, "A", "B", 2, 2),
            played(4, "B", "A", 1, 0),
        ];
        let form = recent_form(&matches, "A", &by_name);
        assert_eq!(form.results, vec![0, 0, 1, -1, -1]);
        assert_eq!(form.total, -1);
    }

    #[test]
    fn prior_source_falls_back_to_lower_division() {
        let top = HashSet::from(["A".to_string()]);
        let top_matches = vec![played(0, "A", "X", 1, 0)];
        let lower_matches = vec![played(0, "P", "Y", 1, 0), played(1, "Y", "P", 0, 0)];
        let prior = PriorSeason {
            top_flight_teams: &top,
            top_flight_matches: &top_matches,
            lower_division_matches: &lower_matches,
        };
        let standings = vec![record("A", 3, 1), record("P", 0, 0), record("Z", 0, 0)];
        let rows = build_team_strength(&standings, &[], prior);

        let a = rows.iter().find(|r| r.team == "A").unwrap();
        assert_eq!(a.weighted_home_wins, 0.5);
        let p = rows.iter().find(|r| r.team == "P").unwrap();
        assert_eq!(p.weighted_home_wins, 0.5);
        assert_eq!(p.weighted_away_draws, 0.5);
        let z = rows.iter().find(|r| r.team == "Z").unwrap();
        assert_eq!(z.weighted_home_wins + z.weighted_away_losses, 0.0);
        assert!(z.form_last_5.is_empty());
        assert_eq!(z.strength_weighted_form, 0.0);
    }
}
