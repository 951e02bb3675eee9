use pl_predictor::PredictError;
use pl_predictor::classifier::{Classifier, SoftmaxModel};
use pl_predictor::matchup::{FEATURE_COUNT, FEATURE_NAMES, MatchupFeatures, build_matchup_features};
use pl_predictor::predictor::{Predictor, generate_insights};
use pl_predictor::records::Outcome;
use pl_predictor::strength_table::StrengthTable;
use pl_predictor::team_strength::TeamStrengthRow;

fn row(team: &str, points: i32, goal_diff: i32, form: &[i8], weighted: f64) -> TeamStrengthRow {
    TeamStrengthRow {
        team: team.to_string(),
        position: 1,
        played: 10,
        wins: 0,
        draws: 0,
        losses: 0,
        goals_for: goal_diff.max(0),
        goals_against: (-goal_diff).max(0),
        goal_diff,
        points,
        home_wins: 0,
        home_draws: 0,
        home_losses: 0,
        away_wins: 0,
        away_draws: 0,
        away_losses: 0,
        weighted_home_wins: 0.0,
        weighted_home_draws: 0.0,
        weighted_home_losses: 0.0,
        weighted_away_wins: 0.0,
        weighted_away_draws: 0.0,
        weighted_away_losses: 0.0,
        form_total: form.iter().map(|&r| r as i32).sum(),
        strength_weighted_form: weighted,
        form_last_5: form.to_vec(),
    }
}

fn scenario_table() -> StrengthTable {
    StrengthTable::from_rows(vec![
        row("TeamA", 50, 20, &[1, 1, 1, 0, 0], 12.5),
        row("TeamB", 30, -5, &[-1, -1, 0, 1, -1], -4.0),
    ])
    .unwrap()
}

/// Returns the same probabilities for every input.
struct FixedClassifier {
    classes: Vec<String>,
    probs: Vec<f64>,
}

impl Classifier for FixedClassifier {
    fn class_order(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, _features: &MatchupFeatures) -> Vec<f64> {
        self.probs.clone()
    }
}

fn fixed(classes: &[&str], probs: &[f64]) -> FixedClassifier {
    FixedClassifier {
        classes: classes.iter().map(|c| c.to_string()).collect(),
        probs: probs.to_vec(),
    }
}

fn small_model() -> SoftmaxModel {
    let classes = ["AwayWin", "Draw", "HomeWin"];
    let mut weights = vec![vec![0.0; FEATURE_COUNT]; 3];
    weights[0][1] = 1.2;
    weights[2][0] = 1.2;
    weights[1][4] = -0.3;
    SoftmaxModel {
        version: 1,
        generated_at: "2025-01-01T00:00:00Z".to_string(),
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        feature_means: vec![40.0, 40.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        feature_stds: vec![10.0, 10.0, 10.0, 10.0, 2.0, 2.0, 8.0, 8.0],
        classes: classes.iter().map(|c| c.to_string()).collect(),
        weights,
        biases: vec![0.0, -0.5, 0.2],
        l2: 1e-3,
        train_log_loss: 0.0,
        val_log_loss: 0.0,
        train_samples: 0,
        val_samples: 0,
    }
}

#[test]
fn scenario_feature_vector_and_insights() {
    let table = scenario_table();
    let features = build_matchup_features(&table, "TeamA", "TeamB").unwrap();
    assert_eq!(features.0, [50.0, 30.0, 20.0, -5.0, 3.0, -2.0, 12.5, -4.0]);

    let predictor = Predictor::new(table, small_model());
    let p = predictor.predict("TeamA", "TeamB").unwrap();
    assert_eq!(p.features, features);
    assert_eq!(p.label, Outcome::HomeWin);
    assert_eq!(
        p.insights,
        vec![
            "TeamA have higher points (50 vs 30).",
            "TeamA have a stronger goal difference (+20 vs -5).",
            "TeamA have better recent form.",
            "TeamA have performed better against stronger opponents recently.",
        ]
    );
}

#[test]
fn reversed_fixture_credits_the_away_side() {
    let predictor = Predictor::new(scenario_table(), small_model());
    let p = predictor.predict("TeamB", "TeamA").unwrap();
    assert_eq!(p.label, Outcome::AwayWin);
    assert!(p.insights[0].starts_with("TeamA have higher points"));
}

#[test]
fn identical_rows_only_report_even_weighted_form() {
    let a = row("Alpha", 40, 5, &[1, 0, -1], 3.0);
    let b = row("Beta", 40, 5, &[0, 0, 0], 3.0);
    assert_eq!(
        generate_insights(&a, &b),
        vec!["Both teams are evenly matched on strength-weighted form."]
    );
}

#[test]
fn probabilities_sum_to_one_for_every_pair() {
    let table = StrengthTable::from_rows(vec![
        row("Alpha", 61, 30, &[1, 1, 1, 1, 0], 40.0),
        row("Beta", 45, 8, &[1, -1, 0, 1, 1], 9.5),
        row("Gamma", 45, 8, &[0, 0, 0, 0, 0], 0.0),
        row("Delta", 12, -35, &[-1, -1, -1, -1, -1], -52.0),
    ])
    .unwrap();
    let predictor = Predictor::new(table, small_model());
    let names = predictor
        .table()
        .team_names()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    for home in &names {
        for away in &names {
            if home == away {
                continue;
            }
            let p = predictor.predict(home, away).unwrap();
            assert!((p.probabilities.sum() - 1.0).abs() < 1e-6, "{home} v {away}");
        }
    }
}

#[test]
fn exact_three_way_tie_predicts_home_win() {
    let x = 1.0 / 3.0;
    // Class order deliberately differs from display order.
    let predictor = Predictor::new(
        scenario_table(),
        fixed(&["AwayWin", "Draw", "HomeWin"], &[x, x, x]),
    );
    let p = predictor.predict("TeamB", "TeamA").unwrap();
    assert_eq!(p.probabilities.as_array(), [x, x, x]);
    assert_eq!(p.label, Outcome::HomeWin);
}

#[test]
fn raw_output_is_mapped_by_label_not_position() {
    let predictor = Predictor::new(
        scenario_table(),
        fixed(&["AwayWin", "Draw", "HomeWin"], &[0.7, 0.2, 0.1]),
    );
    let p = predictor.predict("TeamA", "TeamB").unwrap();
    assert_eq!(p.label, Outcome::AwayWin);
    assert_eq!(p.probabilities.home, 0.1);
    assert_eq!(p.probabilities.away, 0.7);
}

#[test]
fn unknown_team_is_a_lookup_error() {
    let predictor = Predictor::new(scenario_table(), fixed(&["HomeWin"], &[1.0]));
    match predictor.predict("TeamA", "Team C") {
        Err(PredictError::UnknownTeam(name)) => assert_eq!(name, "Team C"),
        other => panic!("expected UnknownTeam, got {:?}", other.map(|p| p.label)),
    }
    // Lookup is exact; resolution of fuzzy input is a separate step.
    assert!(matches!(
        predictor.predict("teama", "TeamB"),
        Err(PredictError::UnknownTeam(_))
    ));
}
