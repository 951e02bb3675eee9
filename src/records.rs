use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One standings row for a team in a season snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
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
}

impl TeamRecord {
    /// Checks the two arithmetic invariants of a standings row.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.goals_for - self.goals_against != self.goal_diff {
            return Err(format!(
                "{}: goals_for {} - goals_against {} != goal_diff {}",
                self.team, self.goals_for, self.goals_against, self.goal_diff
            ));
        }
        if self.wins + self.draws + self.losses != self.played {
            return Err(format!(
                "{}: wins {} + draws {} + losses {} != played {}",
                self.team, self.wins, self.draws, self.losses, self.played
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Scheduled,
    Timed,
    InPlay,
    Paused,
    Finished,
    Postponed,
    Suspended,
    Cancelled,
    Awarded,
    Other,
}

impl MatchStatus {
    pub fn from_api(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SCHEDULED" => MatchStatus::Scheduled,
            "TIMED" => MatchStatus::Timed,
            "IN_PLAY" | "LIVE" => MatchStatus::InPlay,
            "PAUSED" => MatchStatus::Paused,
            "FINISHED" => MatchStatus::Finished,
            "POSTPONED" => MatchStatus::Postponed,
            "SUSPENDED" => MatchStatus::Suspended,
            "CANCELLED" | "CANCELED" => MatchStatus::Cancelled,
            "AWARDED" => MatchStatus::Awarded,
            _ => MatchStatus::Other,
        }
    }
}

/// Full-time score. Both sides are always present together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub kickoff: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    pub score: Option<Score>,
    pub status: MatchStatus,
}

impl MatchRecord {
    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }

    pub fn opponent_of(&self, team: &str) -> Option<&str> {
        if self.home_team == team {
            Some(&self.away_team)
        } else if self.away_team == team {
            Some(&self.home_team)
        } else {
            None
        }
    }

    /// Result from `team`'s perspective: 1 win, 0 draw, -1 loss.
    /// `None` when the match has no final score or `team` did not play.
    pub fn result_for(&self, team: &str) -> Option<i8> {
        let score = self.score?;
        let (own, other) = if self.home_team == team {
            (score.home, score.away)
        } else if self.away_team == team {
            (score.away, score.home)
        } else {
            return None;
        };
        Some(match own.cmp(&other) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Less => -1,
        })
    }
}

/// Match outcome from the home side's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Outcome {
    HomeWin,
    Draw,
    AwayWin,
}

impl Outcome {
    /// Fixed display order used for every probability triple.
    pub const ORDERED: [Outcome; 3] = [Outcome::HomeWin, Outcome::Draw, Outcome::AwayWin];

    pub fn label(self) -> &'static str {
        match self {
            Outcome::HomeWin => "HomeWin",
            Outcome::Draw => "Draw",
            Outcome::AwayWin => "AwayWin",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Outcome::HomeWin => "Home Win",
            Outcome::Draw => "Draw",
            Outcome::AwayWin => "Away Win",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Outcome::HomeWin => 0,
            Outcome::Draw => 1,
            Outcome::AwayWin => 2,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "HomeWin" => Ok(Outcome::HomeWin),
            "Draw" => Ok(Outcome::Draw),
            "AwayWin" => Ok(Outcome::AwayWin),
            other => Err(format!("unknown outcome label {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(home: u32, away: u32) -> MatchRecord {
        MatchRecord {
            kickoff: DateTime::parse_from_rfc3339("2024-09-01T14:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            home_team: "Arsenal FC".to_string(),
            away_team: "Chelsea FC".to_string(),
            score: Some(Score { home, away }),
            status: MatchStatus::Finished,
        }
    }

    #[test]
    fn result_is_taken_from_each_side() {
        let m = fixture(2, 1);
        assert_eq!(m.result_for("Arsenal FC"), Some(1));
        assert_eq!(m.result_for("Chelsea FC"), Some(-1));
        assert_eq!(m.result_for("Fulham FC"), None);
        assert_eq!(fixture(0, 0).result_for("Chelsea FC"), Some(0));
    }

    #[test]
    fn unplayed_match_has_no_result() {
        let mut m = fixture(0, 0);
        m.score = None;
        assert_eq!(m.result_for("Arsenal FC"), None);
    }

    #[test]
    fn validate_flags_inconsistent_rows() {
        let mut row = TeamRecord {
            team: "Arsenal FC".to_string(),
            position: 1,
            played: 10,
            wins: 7,
            draws: 2,
            losses: 1,
            goals_for: 20,
            goals_against: 8,
            goal_diff: 12,
            points: 23,
        };
        assert!(row.validate().is_ok());
        row.goal_diff = 11;
        assert!(row.validate().is_err());
        row.goal_diff = 12;
        row.played = 11;
        assert!(row.validate().is_err());
    }

    #[test]
    fn outcome_labels_round_trip_through_from_str() {
        for o in Outcome::ORDERED {
            assert_eq!(o.label().parse::<Outcome>().unwrap(), o);
        }
        assert!("Home".parse::<Outcome>().is_err());
    }
}
