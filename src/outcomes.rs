//! Outcome estimation
//!
//! Derives secondary clinical estimates from the relapse probability:
//! - Readmission risk (near-linear subset of relapse risk with a floor)
//! - Early intervention window (days; higher risk compresses it)
//! - 3-month medication adherence forecast
//! - False-alarm rate at the active operating point

use crate::config::OutcomeConfig;
use crate::types::{FeatureVector, OutcomeSet, PatientSnapshot};
use tracing::debug;

/// Outcome estimator for a configured set of outcome constants
#[derive(Debug, Clone, Copy)]
pub struct OutcomeEstimator<'a> {
    config: &'a OutcomeConfig,
}

impl<'a> OutcomeEstimator<'a> {
    pub fn new(config: &'a OutcomeConfig) -> Self {
        Self { config }
    }

    /// Build the outcome set for a snapshot and its relapse probability
    pub fn estimate(
        &self,
        snapshot: &PatientSnapshot,
        features: FeatureVector,
        relapse_risk: f64,
    ) -> OutcomeSet {
        let outcomes = OutcomeSet {
            relapse_risk_6_12m: relapse_risk,
            readmission_risk: self.readmission_risk(relapse_risk),
            early_intervention_window_days: self.intervention_window_days(relapse_risk),
            predicted_medication_adherence_3m: self.predicted_adherence(snapshot, relapse_risk),
            estimated_false_alarm_rate: self.false_alarm_rate(relapse_risk),
            features,
        };

        debug!(
            relapse_risk,
            readmission_risk = outcomes.readmission_risk,
            window_days = outcomes.early_intervention_window_days,
            "outcomes estimated"
        );
        outcomes
    }

    /// `clamp(risk * 0.72 + 0.08, 0, 1)`
    pub fn readmission_risk(&self, relapse_risk: f64) -> f64 {
        (relapse_risk * self.config.readmission_slope + self.config.readmission_intercept)
            .clamp(0.0, 1.0)
    }

    /// `max(3, 60 * (1 - risk))`
    pub fn intervention_window_days(&self, relapse_risk: f64) -> f64 {
        (self.config.window_scale_days * (1.0 - relapse_risk)).max(self.config.window_floor_days)
    }

    /// Adherence degrades with predicted relapse and recent missed follow-ups
    pub fn predicted_adherence(&self, snapshot: &PatientSnapshot, relapse_risk: f64) -> f64 {
        (snapshot.medication_adherence_ratio
            - self.config.adherence_risk_penalty * relapse_risk
            - self.config.adherence_followup_penalty * snapshot.missed_followup_ratio)
            .clamp(0.0, 1.0)
    }

    /// Two-valued step: the sensitive rate strictly above the threshold,
    /// the specific rate at or below it.
    pub fn false_alarm_rate(&self, relapse_risk: f64) -> f64 {
        if relapse_risk > self.config.false_alarm_threshold {
            self.config.sensitive_false_alarm_rate
        } else {
            self.config.specific_false_alarm_rate
        }
    }
}
