use tracing_subscriber::EnvFilter;

/// Library target plus each batch binary's own target; everything else at warn.
pub const DEFAULT_DIRECTIVES: &str =
    "pl_predictor=info,build_team_stats=info,train_team_model=info,predict_match=info,warn";

/// Installs the stderr subscriber used by the batch binaries.
/// `RUST_LOG` overrides `DEFAULT_DIRECTIVES`.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_cover_batch_binaries() {
        let filter = EnvFilter::try_new(DEFAULT_DIRECTIVES).unwrap();
        let rendered = filter.to_string();
        for bin in ["build_team_stats", "train_team_model", "predict_match"] {
            assert!(rendered.contains(&format!("{bin}=info")), "{rendered}");
        }
        assert!(rendered.contains("pl_predictor=info"));
    }
}
