//! Matchup prediction over a loaded strength table and classifier.

use std::collections::HashMap;

use tracing::debug;

use crate::classifier::{Classifier, ModelBundle};
use crate::config::DataPaths;
use crate::error::Result;
use crate::matchup::MatchupFeatures;
use crate::metrics::Prob3;
use crate::records::Outcome;
use crate::strength_table::StrengthTable;
use crate::team_strength::TeamStrengthRow;

#[derive(Debug, Clone)]
pub struct MatchPrediction<'a> {
    pub home: &'a TeamStrengthRow,
    pub away: &'a TeamStrengthRow,
    pub features: MatchupFeatures,
    /// `[HomeWin, Draw, AwayWin]`.
    pub probabilities: Prob3,
    pub label: Outcome,
    pub insights: Vec<String>,
}

/// Holds the read-only table and classifier for the life of the process.
#[derive(Debug, Clone)]
pub struct Predictor<C = ModelBundle> {
    table: StrengthTable,
    classifier: C,
}

impl Predictor<ModelBundle> {
    pub fn load(paths: &DataPaths) -> Result<Self> {
        let table = StrengthTable::load(&paths.team_stats, &paths.team_form)?;
        let bundle = ModelBundle::load(paths)?;
        Ok(Self::new(table, bundle))
    }
}

impl<C: Classifier> Predictor<C> {
    pub fn new(table: StrengthTable, classifier: C) -> Self {
        Self { table, classifier }
    }

    pub fn table(&self) -> &StrengthTable {
        &self.table
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Predicts `home` hosting `away`. Names must match table keys exactly.
    pub fn predict(&self, home: &str, away: &str) -> Result<MatchPrediction<'_>> {
        let home_row = self.table.require(home)?;
        let away_row = self.table.require(away)?;
        let features = MatchupFeatures::from_rows(home_row, away_row);

        let raw = self.classifier.predict_proba(&features);
        let probabilities = reindex_probabilities(self.classifier.class_order(), &raw);
        let label = probabilities.argmax();
        debug!(home, away, ?raw, %label, "prediction");

        Ok(MatchPrediction {
            home: home_row,
            away: away_row,
            features,
            probabilities,
            label,
            insights: generate_insights(home_row, away_row),
        })
    }
}

/// Maps classifier output onto `[HomeWin, Draw, AwayWin]`. Labels the
/// classifier does not report get probability 0.
pub fn reindex_probabilities(class_order: &[String], probs: &[f64]) -> Prob3 {
    let by_label: HashMap<&str, f64> = class_order
        .iter()
        .map(String::as_str)
        .zip(probs.iter().copied())
        .collect();
    Prob3::from_array(Outcome::ORDERED.map(|o| by_label.get(o.label()).copied().unwrap_or(0.0)))
}

/// Short comparative statements, in a fixed order: points, goal difference,
/// recent form, strength-weighted form.
pub fn generate_insights(home: &TeamStrengthRow, away: &TeamStrengthRow) -> Vec<String> {
    let mut out = Vec::new();

    if home.points != away.points {
        let (better, worse) = ordered_by(home, away, home.points > away.points);
        out.push(format!(
            "{} have higher points ({} vs {}).",
            better.team, better.points, worse.points
        ));
    }

    if home.goal_diff != away.goal_diff {
        let (better, worse) = ordered_by(home, away, home.goal_diff > away.goal_diff);
        out.push(format!(
            "{} have a stronger goal difference ({:+} vs {:+}).",
            better.team, better.goal_diff, worse.goal_diff
        ));
    }

    if home.form_total != away.form_total {
        let (better, _) = ordered_by(home, away, home.form_total > away.form_total);
        out.push(format!("{} have better recent form.", better.team));
    }

    if home.strength_weighted_form == away.strength_weighted_form {
        out.push("Both teams are evenly matched on strength-weighted form.".to_string());
    } else {
        let (better, _) = ordered_by(
            home,
            away,
            home.strength_weighted_form > away.strength_weighted_form,
        );
        out.push(format!(
            "{} have performed better against stronger opponents recently.",
            better.team
        ));
    }

    out
}

fn ordered_by<'a>(
    home: &'a TeamStrengthRow,
    away: &'a TeamStrengthRow,
    home_better: bool,
) -> (&'a TeamStrengthRow, &'a TeamStrengthRow) {
    if home_better { (home, away) } else { (away, home) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reindex_follows_class_order_not_position() {
        let p = reindex_probabilities(&labels(&["AwayWin", "Draw", "HomeWin"]), &[0.1, 0.3, 0.6]);
        assert_eq!(p.as_array(), [0.6, 0.3, 0.1]);
    }

    #[test]
    fn reindex_defaults_missing_labels_to_zero() {
        let p = reindex_probabilities(&labels(&["HomeWin", "AwayWin"]), &[0.7, 0.3]);
        assert_eq!(p.as_array(), [0.7, 0.0, 0.3]);
        assert!((p.sum() - 1.0).abs() < 1e-12);
    }
}
