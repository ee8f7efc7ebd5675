//! Anomaly model: an isolation forest fit once on the synthetic baseline.
//!
//! There is no unfitted state. [`initialize_model`] and [`AnomalyModel::fit`]
//! build the forest eagerly, and the result is read-only, so one model can be
//! shared across threads behind an `Arc` or a plain reference.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::baseline::{baseline_rng, generate_baseline, DEFAULT_BASELINE_SIZE};
use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::forest::{ForestParams, IsolationForest, DEFAULT_MAX_SAMPLES, DEFAULT_N_ESTIMATORS};

pub const DEFAULT_CONTAMINATION: f64 = 0.15;
pub const DEFAULT_RANDOM_STATE: u64 = 42;

pub const MODEL_DESCRIPTION: &str = "IsolationForest (Anomaly Detection)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Expected outlier fraction of the baseline, in (0, 0.5].
    pub contamination: f64,
    /// Seed for tree construction.
    pub random_state: u64,
    pub baseline_size: usize,
    /// Seed for baseline sampling; `None` uses OS entropy.
    pub baseline_seed: Option<u64>,
    pub n_estimators: usize,
    pub max_samples: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            contamination: DEFAULT_CONTAMINATION,
            random_state: DEFAULT_RANDOM_STATE,
            baseline_size: DEFAULT_BASELINE_SIZE,
            baseline_seed: None,
            n_estimators: DEFAULT_N_ESTIMATORS,
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            bail!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            );
        }
        if self.baseline_size < 2 {
            bail!("baseline_size must be at least 2, got {}", self.baseline_size);
        }
        if self.n_estimators == 0 {
            bail!("n_estimators must be at least 1");
        }
        if self.max_samples < 2 {
            bail!("max_samples must be at least 2, got {}", self.max_samples);
        }
        Ok(())
    }
}

/// Load a [`ModelConfig`] from JSON. Missing keys take their defaults.
pub fn load_model_config(path: &Path) -> Result<ModelConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read model config {}", path.display()))?;
    let config: ModelConfig = serde_json::from_str(&data)
        .with_context(|| format!("invalid model config {}", path.display()))?;
    Ok(config)
}

#[derive(Debug, Clone)]
pub struct AnomalyModel {
    forest: IsolationForest,
    /// Baseline score at the contamination quantile.
    offset: f64,
    contamination: f64,
}

impl AnomalyModel {
    /// Fit on `baseline` rows (one 6-field feature vector per row).
    pub fn fit(baseline: ArrayView2<f64>, config: &ModelConfig) -> Result<Self> {
        config.validate()?;
        if baseline.ncols() != FEATURE_COUNT {
            bail!(
                "baseline must have {FEATURE_COUNT} columns, got {}",
                baseline.ncols()
            );
        }
        if baseline.nrows() < 2 {
            bail!("baseline must have at least 2 rows, got {}", baseline.nrows());
        }

        let forest = IsolationForest::fit(
            baseline,
            &ForestParams {
                n_estimators: config.n_estimators,
                max_samples: config.max_samples,
                random_state: config.random_state,
            },
        );

        let mut scores = forest.score_rows(baseline);
        scores.sort_by(f64::total_cmp);
        let offset = percentile(&scores, 100.0 * config.contamination);

        info!(
            trees = forest.n_estimators(),
            max_samples = forest.max_samples(),
            rows = baseline.nrows(),
            offset,
            "anomaly model fitted"
        );

        Ok(Self {
            forest,
            offset,
            contamination: config.contamination,
        })
    }

    /// Signed anomaly score: negative means more anomalous than the
    /// contamination quantile of the baseline.
    pub fn score(&self, features: &FeatureVector) -> f64 {
        let row = features.as_array();
        let raw = self.forest.score_samples(ArrayView1::from(&row[..])) - self.offset;
        debug!(raw, "scored feature vector");
        raw
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn contamination(&self) -> f64 {
        self.contamination
    }
}

/// Generate the synthetic baseline and fit the model on it.
///
/// Call once at startup; every assessment borrows the returned model.
pub fn initialize_model(config: &ModelConfig) -> Result<AnomalyModel> {
    config.validate()?;
    let mut rng = baseline_rng(config.baseline_seed);
    let baseline = generate_baseline(config.baseline_size, &mut rng);
    debug!(
        rows = baseline.nrows(),
        seeded = config.baseline_seed.is_some(),
        "generated baseline population"
    );
    AnomalyModel::fit(baseline.view(), config)
}

/// Linear-interpolated percentile of sorted, non-empty `sorted`.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
