pub mod classifier;
pub mod config;
pub mod error;
pub mod football_data;
pub mod http_client;
pub mod logging;
pub mod matchup;
pub mod metrics;
pub mod overview;
pub mod predictor;
pub mod records;
pub mod strength_table;
pub mod team_names;
pub mod team_strength;
pub mod training;

pub use error::{PredictError, Result};
