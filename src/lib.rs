//! Jiwa - heuristic relapse-risk scoring from digital phenotyping signals
//!
//! Jiwa turns a patient's current vs. baseline behavioral and linguistic
//! measurements into a relapse probability through a deterministic pipeline:
//! feature extraction → weighted logistic calibration → outcome estimation →
//! routine-care comparison.
//!
//! Intended for prototyping a triage tool for stabilized bipolar/psychosis
//! patients. The weights and deltas are hand-tuned constants, not a validated
//! clinical model.

pub mod calibrator;
pub mod comparison;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod intake;
pub mod outcomes;
pub mod pipeline;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{PredictorConfig, WeightTable};
pub use error::RelapseError;
pub use pipeline::{
    compare_with_routine_followup, compute_relapse_probability, estimate_outcomes,
    extract_features, snapshot_to_assessment_json, RelapsePredictor,
};
pub use types::{
    ComparisonSet, FeatureName, FeatureVector, OutcomeSet, PatientSnapshot, RiskAssessment,
    RiskBand,
};

/// Jiwa version embedded in all assessments
pub const JIWA_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for assessments
pub const PRODUCER_NAME: &str = "jiwa-relapse";
