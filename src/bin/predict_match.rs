use anyhow::{Context, Result, bail};

use pl_predictor::config::{self, DataPaths};
use pl_predictor::logging;
use pl_predictor::overview::team_overview;
use pl_predictor::predictor::Predictor;
use pl_predictor::records::Outcome;
use pl_predictor::team_names::TeamNameResolver;

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init();

    let (Some(home_raw), Some(away_raw)) = (config::arg_value("--home"), config::arg_value("--away"))
    else {
        bail!("usage: predict_match --home <team> --away <team>");
    };

    let predictor = Predictor::load(&DataPaths::from_env())?;
    let resolver = TeamNameResolver::from_table(predictor.table());
    let home = resolver
        .require(&home_raw)
        .with_context(|| format!("Could not match team {home_raw:?}"))?;
    let away = resolver
        .require(&away_raw)
        .with_context(|| format!("Could not match team {away_raw:?}"))?;
    if home == away {
        bail!("home and away resolve to the same team: {home}");
    }

    let prediction = predictor.predict(home, away)?;
    println!("{home} vs {away}");
    for row in [prediction.home, prediction.away] {
        let fields = team_overview(row)
            .into_iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>();
        println!("  {:<28} {}", row.team, fields.join(" | "));
    }
    println!("Prediction: {}", prediction.label.display_name());
    for outcome in Outcome::ORDERED {
        println!(
            "  {:<9} {:>5.1}%",
            outcome.display_name(),
            prediction.probabilities.get(outcome) * 100.0
        );
    }
    println!("Insights:");
    for line in &prediction.insights {
        println!(" - {line}");
    }
    Ok(())
}
