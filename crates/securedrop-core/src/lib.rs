//! securedrop-core — pre-open risk assessment for uploaded files.
//!
//! Provides byte-level feature extraction, a synthetic baseline, an
//! isolation-forest anomaly model, fixed-weight risk fusion, and the
//! indicator/recommendation text consumed by the CLI.
//!
//! Callers are expected to gate inputs at [`scan::MAX_UPLOAD_BYTES`]; the
//! pure functions here accept any length, but behavior above the cap is not
//! part of the contract.

pub mod advice;
pub mod baseline;
pub mod features;
pub mod forest;
pub mod model;
pub mod report;
pub mod risk;
pub mod scan;

pub use advice::{indicators, recommendations};
pub use baseline::generate_baseline;
pub use features::{extract, FeatureVector};
pub use model::{initialize_model, load_model_config, AnomalyModel, ModelConfig};
pub use risk::{assess, fuse, RiskAssessment, RiskLevel};
