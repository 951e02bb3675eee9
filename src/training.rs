//! Fits the outcome classifier on synthetic matchups built from the strength table.

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::classifier::{Classifier, LabelEncoder, MODEL_VERSION, SoftmaxModel};
use crate::error::{PredictError, Result};
use crate::matchup::{FEATURE_COUNT, FEATURE_NAMES, MatchupFeatures, all_matchups};
use crate::metrics::{ClassReport, Metrics, Prob3, classification_report, evaluate_probs};
use crate::predictor::reindex_probabilities;
use crate::records::Outcome;
use crate::strength_table::StrengthTable;
use crate::team_strength::TeamStrengthRow;

const IMPROVEMENT_EPS: f64 = 1e-7;
const EVAL_EVERY: usize = 20;
const PATIENCE: usize = 20;

#[derive(Debug, Clone, Copy)]
pub struct TrainConfig {
    pub l2: f64,
    pub learning_rate: f64,
    pub max_iters: usize,
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            l2: 1e-3,
            learning_rate: 0.5,
            max_iters: 4000,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TrainSample {
    pub x: [f64; FEATURE_COUNT],
    /// Index into the label encoder's classes.
    pub class: usize,
}

#[derive(Debug, Clone)]
pub struct TrainReport {
    pub model: SoftmaxModel,
    pub encoder: LabelEncoder,
    pub test_metrics: Metrics,
    pub per_class: Vec<ClassReport>,
    /// Accuracy drop when each feature column is shuffled, in `FEATURE_NAMES` order.
    pub importances: [f64; FEATURE_COUNT],
}

/// Proxy target: the side with more points is expected to win.
pub fn proxy_outcome(home: &TeamStrengthRow, away: &TeamStrengthRow) -> Outcome {
    match home.points.cmp(&away.points) {
        std::cmp::Ordering::Greater => Outcome::HomeWin,
        std::cmp::Ordering::Less => Outcome::AwayWin,
        std::cmp::Ordering::Equal => Outcome::Draw,
    }
}

/// One labelled sample per ordered pair of distinct teams.
pub fn build_training_set(table: &StrengthTable) -> Vec<(MatchupFeatures, Outcome)> {
    all_matchups(table)
        .into_iter()
        .map(|m| (m.features, proxy_outcome(m.home, m.away)))
        .collect()
}

pub fn train(table: &StrengthTable, cfg: TrainConfig) -> Result<TrainReport> {
    let dataset = build_training_set(table);
    if dataset.is_empty() {
        return Err(PredictError::InvalidData(
            "strength table needs at least two teams to train".into(),
        ));
    }

    let encoder = LabelEncoder::fit(dataset.iter().map(|(_, o)| o.label()));
    if encoder.classes.len() < 2 {
        return Err(PredictError::InvalidData(format!(
            "training target has a single class {:?}",
            encoder.classes
        )));
    }

    let samples = dataset
        .iter()
        .filter_map(|(f, o)| {
            encoder
                .transform(o.label())
                .map(|class| TrainSample { x: f.0, class })
        })
        .collect::<Vec<_>>();

    let labels = samples.iter().map(|s| s.class).collect::<Vec<_>>();
    let (train_idx, test_idx) = stratified_split(&labels, cfg.test_fraction, cfg.seed);
    let train_set = train_idx.iter().map(|&i| samples[i]).collect::<Vec<_>>();
    let test_set = test_idx.iter().map(|&i| samples[i]).collect::<Vec<_>>();
    info!(
        samples = samples.len(),
        train = train_set.len(),
        test = test_set.len(),
        classes = ?encoder.classes,
        "training matchup classifier"
    );

    let model = fit_softmax(&train_set, &test_set, &encoder, cfg);

    let eval_set = if test_set.is_empty() { &train_set } else { &test_set };
    let probs = eval_set
        .iter()
        .map(|s| predict_ordered(&model, &s.x))
        .collect::<Vec<_>>();
    let actual = eval_set
        .iter()
        .map(|s| class_outcome(&encoder, s.class))
        .collect::<Vec<_>>();
    let predicted = probs.iter().map(Prob3::argmax).collect::<Vec<_>>();

    Ok(TrainReport {
        test_metrics: evaluate_probs(&probs, &actual),
        per_class: classification_report(&predicted, &actual),
        importances: permutation_importance(&model, &encoder, eval_set, cfg.seed),
        model,
        encoder,
    })
}

/// Splits indices so each class keeps roughly `test_fraction` of its samples in test.
pub fn stratified_split(labels: &[usize], test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let n_classes = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in 0..n_classes {
        let mut idx = labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == class)
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        idx.shuffle(&mut rng);
        let n_test = if idx.len() < 2 {
            0
        } else {
            ((idx.len() as f64) * test_fraction.clamp(0.0, 0.9)).round() as usize
        };
        test.extend_from_slice(&idx[..n_test]);
        train.extend_from_slice(&idx[n_test..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

/// Batch gradient descent on softmax cross-entropy with L2, keeping the
/// coefficients with the best validation log-loss.
pub fn fit_softmax(
    train: &[TrainSample],
    val: &[TrainSample],
    encoder: &LabelEncoder,
    cfg: TrainConfig,
) -> SoftmaxModel {
    let k = encoder.classes.len();
    let (means, stds) = feature_norm_stats(train);
    let mut model = SoftmaxModel {
        version: MODEL_VERSION,
        generated_at: Utc::now().to_rfc3339(),
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        feature_means: means.to_vec(),
        feature_stds: stds.to_vec(),
        classes: encoder.classes.clone(),
        weights: vec![vec![0.0; FEATURE_COUNT]; k],
        biases: vec![0.0; k],
        l2: cfg.l2,
        train_log_loss: 0.0,
        val_log_loss: 0.0,
        train_samples: train.len(),
        val_samples: val.len(),
    };
    if train.is_empty() {
        return model;
    }

    let train_z = train
        .iter()
        .map(|s| (model.standardize(&s.x), s.class))
        .collect::<Vec<_>>();
    let val_z = val
        .iter()
        .map(|s| (model.standardize(&s.x), s.class))
        .collect::<Vec<_>>();
    let monitor = if val_z.is_empty() { &train_z } else { &val_z };

    let mut best = (model.weights.clone(), model.biases.clone());
    let mut best_loss = log_loss(&model, monitor);
    let mut no_improve = 0usize;
    let n = train_z.len() as f64;

    for iter in 0..cfg.max_iters {
        let mut grad_w = vec![[0.0; FEATURE_COUNT]; k];
        let mut grad_b = vec![0.0; k];
        for (z, class) in &train_z {
            let p = model.probs_standardized(z);
            for c in 0..k {
                let d = p[c] - if c == *class { 1.0 } else { 0.0 };
                grad_b[c] += d;
                for j in 0..FEATURE_COUNT {
                    grad_w[c][j] += d * z[j];
                }
            }
        }

        let lr = cfg.learning_rate / (1.0 + iter as f64 * 0.003);
        for c in 0..k {
            model.biases[c] -= lr * grad_b[c] / n;
            for j in 0..FEATURE_COUNT {
                let g = grad_w[c][j] / n + cfg.l2 * model.weights[c][j];
                model.weights[c][j] -= lr * g;
            }
        }

        if iter % EVAL_EVERY == 0 || iter + 1 == cfg.max_iters {
            let loss = log_loss(&model, monitor);
            debug!(iter, loss, "softmax fit");
            if loss + IMPROVEMENT_EPS < best_loss {
                best_loss = loss;
                best = (model.weights.clone(), model.biases.clone());
                no_improve = 0;
            } else {
                no_improve += 1;
                if no_improve >= PATIENCE {
                    break;
                }
            }
        }
    }

    model.weights = best.0;
    model.biases = best.1;
    model.train_log_loss = log_loss(&model, &train_z);
    model.val_log_loss = if val_z.is_empty() {
        model.train_log_loss
    } else {
        log_loss(&model, &val_z)
    };
    model
}

fn log_loss(model: &SoftmaxModel, samples: &[([f64; FEATURE_COUNT], usize)]) -> f64 {
    if samples.is_empty() {
        return f64::INFINITY;
    }
    let sum: f64 = samples
        .iter()
        .map(|(z, class)| -model.probs_standardized(z)[*class].max(1e-12).ln())
        .sum();
    sum / samples.len() as f64
}

fn feature_norm_stats(samples: &[TrainSample]) -> ([f64; FEATURE_COUNT], [f64; FEATURE_COUNT]) {
    let mut mean = [0.0; FEATURE_COUNT];
    let mut std = [1.0; FEATURE_COUNT];
    if samples.is_empty() {
        return (mean, std);
    }
    let n = samples.len() as f64;
    for s in samples {
        for i in 0..FEATURE_COUNT {
            mean[i] += s.x[i] / n;
        }
    }
    let mut var = [0.0; FEATURE_COUNT];
    for s in samples {
        for i in 0..FEATURE_COUNT {
            let d = s.x[i] - mean[i];
            var[i] += d * d / n;
        }
    }
    for i in 0..FEATURE_COUNT {
        std[i] = var[i].sqrt().max(1e-6);
    }
    (mean, std)
}

fn predict_ordered(model: &SoftmaxModel, x: &[f64; FEATURE_COUNT]) -> Prob3 {
    let probs = model.predict_proba(&MatchupFeatures(*x));
    reindex_probabilities(model.class_order(), &probs)
}

fn class_outcome(encoder: &LabelEncoder, class: usize) -> Outcome {
    encoder
        .inverse_transform(class)
        .and_then(|l| l.parse().ok())
        .unwrap_or(Outcome::Draw)
}

/// Accuracy lost when one feature column is shuffled across `samples`.
pub fn permutation_importance(
    model: &SoftmaxModel,
    encoder: &LabelEncoder,
    samples: &[TrainSample],
    seed: u64,
) -> [f64; FEATURE_COUNT] {
    let mut out = [0.0; FEATURE_COUNT];
    if samples.is_empty() {
        return out;
    }
    let accuracy = |xs: &[[f64; FEATURE_COUNT]]| {
        let correct = xs
            .iter()
            .zip(samples)
            .filter(|(x, s)| predict_ordered(model, x).argmax() == class_outcome(encoder, s.class))
            .count();
        correct as f64 / samples.len() as f64
    };

    let base_x = samples.iter().map(|s| s.x).collect::<Vec<_>>();
    let baseline = accuracy(&base_x[..]);
    let mut rng = StdRng::seed_from_u64(seed);
    for j in 0..FEATURE_COUNT {
        let mut column = base_x.iter().map(|x| x[j]).collect::<Vec<_>>();
        column.shuffle(&mut rng);
        let mut shuffled = base_x.clone();
        for (x, v) in shuffled.iter_mut().zip(column) {
            x[j] = v;
        }
        out[j] = baseline - accuracy(&shuffled[..]);
    }
    out
}
