use crate::error::Result;
use crate::strength_table::StrengthTable;
use crate::team_strength::TeamStrengthRow;

pub const FEATURE_COUNT: usize = 8;

/// Classifier input schema. Training and inference both index by this order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "home_points",
    "away_points",
    "home_goal_diff",
    "away_goal_diff",
    "home_form",
    "away_form",
    "home_weighted_form",
    "away_weighted_form",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchupFeatures(pub [f64; FEATURE_COUNT]);

impl MatchupFeatures {
    /// Raw aggregates, unscaled.
    pub fn from_rows(home: &TeamStrengthRow, away: &TeamStrengthRow) -> Self {
        Self([
            home.points as f64,
            away.points as f64,
            home.goal_diff as f64,
            away.goal_diff as f64,
            home.form_total as f64,
            away.form_total as f64,
            home.strength_weighted_form,
            away.strength_weighted_form,
        ])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

/// Feature vector for `home` hosting `away`. Both names must be exact table keys.
pub fn build_matchup_features(
    table: &StrengthTable,
    home: &str,
    away: &str,
) -> Result<MatchupFeatures> {
    let home_row = table.require(home)?;
    let away_row = table.require(away)?;
    Ok(MatchupFeatures::from_rows(home_row, away_row))
}

#[derive(Debug, Clone)]
pub struct Matchup<'a> {
    pub home: &'a TeamStrengthRow,
    pub away: &'a TeamStrengthRow,
    pub features: MatchupFeatures,
}

/// Every ordered pair of distinct teams, in table order.
pub fn all_matchups(table: &StrengthTable) -> Vec<Matchup<'_>> {
    let rows = table.rows();
    let mut out = Vec::with_capacity(rows.len() * rows.len().saturating_sub(1));
    for home in rows {
        for away in rows {
            if home.team == away.team {
                continue;
            }
            out.push(Matchup {
                home,
                away,
                features: MatchupFeatures::from_rows(home, away),
            });
        }
    }
    out
}
