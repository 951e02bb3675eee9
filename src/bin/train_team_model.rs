use anyhow::{Context, Result};

use pl_predictor::classifier::ModelBundle;
use pl_predictor::config::{self, DataPaths};
use pl_predictor::logging;
use pl_predictor::matchup::FEATURE_NAMES;
use pl_predictor::strength_table::StrengthTable;
use pl_predictor::training::{self, TrainConfig};

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init();

    let paths = DataPaths::from_env();
    let mut cfg = TrainConfig::default();
    if let Some(raw) = config::arg_value("--seed") {
        cfg.seed = raw.parse().with_context(|| format!("--seed: {raw}"))?;
    }
    if let Some(raw) = config::arg_value("--l2") {
        cfg.l2 = raw.parse().with_context(|| format!("--l2: {raw}"))?;
    }
    if let Some(raw) = config::arg_value("--max-iters") {
        cfg.max_iters = raw.parse().with_context(|| format!("--max-iters: {raw}"))?;
    }

    let table = StrengthTable::load(&paths.team_stats, &paths.team_form).with_context(|| {
        format!(
            "load strength table from {}; run build_team_stats first",
            paths.team_stats.display()
        )
    })?;
    let report = training::train(&table, cfg)?;
    let bundle = ModelBundle::save(&report.model, &report.encoder, &paths)?;

    let m = report.test_metrics;
    println!("Matchup classifier trained");
    println!("Teams: {}", table.len());
    println!(
        "Samples: train={} test={}",
        report.model.train_samples, report.model.val_samples
    );
    println!("Classes: {}", bundle.class_order.classes.join(", "));
    println!(
        "Test: accuracy={:.3} log_loss={:.4} brier={:.4} (n={})",
        m.accuracy, m.log_loss, m.brier, m.samples
    );
    println!("{:<10} {:>9} {:>7} {:>6} {:>8}", "class", "precision", "recall", "f1", "support");
    for c in &report.per_class {
        println!(
            "{:<10} {:>9.3} {:>7.3} {:>6.3} {:>8}",
            c.outcome.label(),
            c.precision,
            c.recall,
            c.f1,
            c.support
        );
    }
    println!("Permutation importance (accuracy drop):");
    let mut ranked = FEATURE_NAMES
        .iter()
        .zip(report.importances)
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    for (name, drop) in ranked {
        println!(" - {name:<20} {drop:+.4}");
    }
    println!("Model: {}", paths.model.display());
    println!("Encoder: {}", paths.label_encoder.display());
    println!("Class order: {}", paths.model_classes.display());
    Ok(())
}
