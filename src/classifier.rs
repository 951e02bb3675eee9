//! Outcome classifier and the three artifacts it is persisted as.
//!
//! The model file, the label encoder and the class-order bridge are written
//! together. The bridge carries the SHA-256 of the model file so a model that
//! was retrained without regenerating the bridge is rejected at load time.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::config::DataPaths;
use crate::error::{PredictError, Result};
use crate::matchup::{FEATURE_COUNT, FEATURE_NAMES, MatchupFeatures};
use crate::records::Outcome;

pub const MODEL_VERSION: u32 = 1;
pub const BRIDGE_SCHEMA_VERSION: u32 = 1;

/// Anything that maps a feature vector to class probabilities.
pub trait Classifier {
    /// Labels in the order `predict_proba` reports them.
    fn class_order(&self) -> &[String];

    fn predict_proba(&self, features: &MatchupFeatures) -> Vec<f64>;
}

/// Multinomial logistic regression over standardized features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftmaxModel {
    pub version: u32,
    pub generated_at: String,
    pub feature_names: Vec<String>,
    pub feature_means: Vec<f64>,
    pub feature_stds: Vec<f64>,
    /// Row `k` of `weights` and `biases[k]` belong to `classes[k]`.
    pub classes: Vec<String>,
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
    #[serde(default)]
    pub l2: f64,
    #[serde(default)]
    pub train_log_loss: f64,
    #[serde(default)]
    pub val_log_loss: f64,
    #[serde(default)]
    pub train_samples: usize,
    #[serde(default)]
    pub val_samples: usize,
}

impl SoftmaxModel {
    pub fn standardize(&self, x: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            out[i] = (x[i] - self.feature_means[i]) / self.feature_stds[i].max(1e-6);
        }
        out
    }

    /// Probabilities in `classes` order for an already standardized vector.
    pub fn probs_standardized(&self, z: &[f64; FEATURE_COUNT]) -> Vec<f64> {
        let logits = self
            .weights
            .iter()
            .zip(&self.biases)
            .map(|(w, b)| b + w.iter().zip(z).map(|(a, x)| a * x).sum::<f64>())
            .collect::<Vec<_>>();
        softmax(&logits)
    }

    fn check_shape(&self, path: &Path) -> Result<()> {
        if !self.feature_names.iter().map(String::as_str).eq(FEATURE_NAMES) {
            return Err(PredictError::SchemaDrift {
                file: path.to_path_buf(),
                expected: FEATURE_NAMES.join(","),
                found: self.feature_names.join(","),
            });
        }
        let k = self.classes.len();
        let shaped = self.feature_means.len() == FEATURE_COUNT
            && self.feature_stds.len() == FEATURE_COUNT
            && self.weights.len() == k
            && self.biases.len() == k
            && self.weights.iter().all(|w| w.len() == FEATURE_COUNT);
        if k == 0 || !shaped {
            return Err(PredictError::ArtifactMismatch(format!(
                "model {} has inconsistent dimensions",
                path.display()
            )));
        }
        Ok(())
    }
}

impl Classifier for SoftmaxModel {
    fn class_order(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, features: &MatchupFeatures) -> Vec<f64> {
        self.probs_standardized(&self.standardize(&features.0))
    }
}

pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let mx = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps = logits.iter().map(|l| (l - mx).exp()).collect::<Vec<_>>();
    let den = exps.iter().sum::<f64>().max(1e-300);
    exps.into_iter().map(|e| e / den).collect()
}

/// Sorted class labels; index `i` encodes `classes[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let classes = labels
            .into_iter()
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self { classes }
    }

    pub fn transform(&self, label: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == label)
    }

    pub fn inverse_transform(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }
}

/// Class-order bridge between training and serving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassOrder {
    pub schema_version: u32,
    pub classes: Vec<String>,
    pub model_sha256: String,
}

/// Model, encoder and bridge, loaded and validated as one unit.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub model: SoftmaxModel,
    pub encoder: LabelEncoder,
    pub class_order: ClassOrder,
}

impl ModelBundle {
    pub fn load(paths: &DataPaths) -> Result<Self> {
        let model_bytes = read_required(&paths.model, "model")?;
        let encoder_bytes = read_required(&paths.label_encoder, "label encoder")?;
        let bridge_bytes = read_required(&paths.model_classes, "class-order")?;

        let model: SoftmaxModel = serde_json::from_slice(&model_bytes)?;
        let encoder: LabelEncoder = serde_json::from_slice(&encoder_bytes)?;
        let class_order: ClassOrder = serde_json::from_slice(&bridge_bytes)?;

        if model.version != MODEL_VERSION {
            return Err(PredictError::ArtifactMismatch(format!(
                "model version {} is not supported (expected {MODEL_VERSION})",
                model.version
            )));
        }
        if class_order.schema_version != BRIDGE_SCHEMA_VERSION {
            return Err(PredictError::ArtifactMismatch(format!(
                "class-order schema version {} is not supported (expected {BRIDGE_SCHEMA_VERSION})",
                class_order.schema_version
            )));
        }
        let digest = sha256_hex(&model_bytes);
        if !digest.eq_ignore_ascii_case(&class_order.model_sha256) {
            return Err(PredictError::ArtifactMismatch(format!(
                "{} was written for a different model (checksum {} != {})",
                paths.model_classes.display(),
                class_order.model_sha256,
                digest
            )));
        }
        model.check_shape(&paths.model)?;
        check_classes(&model, &encoder, &class_order)?;

        info!(
            classes = ?class_order.classes,
            trained = %model.generated_at,
            "loaded model bundle"
        );
        Ok(Self {
            model,
            encoder,
            class_order,
        })
    }

    /// Writes all three artifacts. The bridge is written last.
    pub fn save(model: &SoftmaxModel, encoder: &LabelEncoder, paths: &DataPaths) -> Result<Self> {
        let model_json = serde_json::to_vec_pretty(model)?;
        let class_order = ClassOrder {
            schema_version: BRIDGE_SCHEMA_VERSION,
            classes: model.classes.clone(),
            model_sha256: sha256_hex(&model_json),
        };
        write_atomic(&paths.model, &model_json)?;
        write_atomic(&paths.label_encoder, &serde_json::to_vec_pretty(encoder)?)?;
        write_atomic(&paths.model_classes, &serde_json::to_vec_pretty(&class_order)?)?;
        Ok(Self {
            model: model.clone(),
            encoder: encoder.clone(),
            class_order,
        })
    }
}

impl Classifier for ModelBundle {
    fn class_order(&self) -> &[String] {
        &self.class_order.classes
    }

    fn predict_proba(&self, features: &MatchupFeatures) -> Vec<f64> {
        self.model.predict_proba(features)
    }
}

fn check_classes(model: &SoftmaxModel, encoder: &LabelEncoder, bridge: &ClassOrder) -> Result<()> {
    if bridge.classes != model.classes {
        return Err(PredictError::ArtifactMismatch(format!(
            "class order {:?} does not match model classes {:?}",
            bridge.classes, model.classes
        )));
    }
    for label in &bridge.classes {
        if label.parse::<Outcome>().is_err() {
            return Err(PredictError::ArtifactMismatch(format!(
                "class-order file names unknown label {label:?}"
            )));
        }
    }
    let bridge_set = bridge.classes.iter().collect::<BTreeSet<_>>();
    let encoder_set = encoder.classes.iter().collect::<BTreeSet<_>>();
    if bridge_set.len() != bridge.classes.len() || bridge_set != encoder_set {
        return Err(PredictError::ArtifactMismatch(format!(
            "label encoder classes {:?} do not match class order {:?}",
            encoder.classes, bridge.classes
        )));
    }
    Ok(())
}

fn read_required(path: &Path, what: &str) -> Result<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(PredictError::Config(format!(
            "{what} file {} is missing; rerun train_team_model",
            path.display()
        ))),
        Err(err) => Err(err.into()),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
