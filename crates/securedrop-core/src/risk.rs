//! Risk fusion: anomaly score + heuristics → bounded score and level.
//!
//! ```text
//! anomaly = sigmoid(-raw * 5)
//! risk    = 0.5 * anomaly + 0.2 * min(entropy / 8, 1)
//!         + 0.15 * double_ext + 0.15 * exe_flag          (clamped to [0, 1])
//! ```
//!
//! Weights and thresholds are fixed policy, not configuration.

use std::fmt;

use serde::Serialize;

use crate::features::FeatureVector;
use crate::model::AnomalyModel;

pub const ANOMALY_SCALE: f64 = 5.0;
pub const MAX_ENTROPY: f64 = 8.0;

pub const ANOMALY_WEIGHT: f64 = 0.5;
pub const ENTROPY_WEIGHT: f64 = 0.2;
pub const DOUBLE_EXT_WEIGHT: f64 = 0.15;
pub const EXE_FLAG_WEIGHT: f64 = 0.15;

/// Lowest score classified MEDIUM.
pub const MEDIUM_THRESHOLD: f64 = 0.35;
/// Lowest score classified HIGH.
pub const HIGH_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Half-open bands: `[0, 0.35)`, `[0.35, 0.7)`, `[0.7, 1]`.
    pub fn from_score(score: f64) -> Self {
        if score < MEDIUM_THRESHOLD {
            RiskLevel::Low
        } else if score < HIGH_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub level: RiskLevel,
    pub features: FeatureVector,
}

impl RiskAssessment {
    /// Score as a percentage rounded to two decimals.
    pub fn percentage(&self) -> f64 {
        (self.risk_score * 100.0 * 100.0).round() / 100.0
    }

    /// Whole percent, truncated, for gauge-style displays.
    pub fn gauge_percent(&self) -> u8 {
        (self.risk_score * 100.0) as u8
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Map the model's signed score into (0, 1), higher = more anomalous.
pub fn anomaly_probability(raw_score: f64) -> f64 {
    sigmoid(-raw_score * ANOMALY_SCALE)
}

pub fn entropy_risk(entropy: f64) -> f64 {
    (entropy / MAX_ENTROPY).min(1.0)
}

/// Combine a raw anomaly score with the vector's heuristics.
pub fn fuse(raw_score: f64, features: &FeatureVector) -> (f64, RiskLevel) {
    let score = ANOMALY_WEIGHT * anomaly_probability(raw_score)
        + ENTROPY_WEIGHT * entropy_risk(features.entropy)
        + DOUBLE_EXT_WEIGHT * features.double_ext
        + EXE_FLAG_WEIGHT * features.exe_flag;

    let score = score.clamp(0.0, 1.0);
    (score, RiskLevel::from_score(score))
}

pub fn assess(model: &AnomalyModel, features: FeatureVector) -> RiskAssessment {
    let (risk_score, level) = fuse(model.score(&features), &features);
    RiskAssessment {
        risk_score,
        level,
        features,
    }
}
