//! Pipeline orchestration
//!
//! This module provides the public API for Jiwa.
//! It chains the four stages: snapshot → features → probability → outcomes →
//! routine-care comparison.

use crate::calibrator::RiskCalibrator;
use crate::comparison::BaselineComparator;
use crate::config::{PredictorConfig, WeightTable};
use crate::encoder::AssessmentEncoder;
use crate::error::RelapseError;
use crate::features::FeatureExtractor;
use crate::intake::parse_snapshot;
use crate::outcomes::OutcomeEstimator;
use crate::types::{ComparisonSet, FeatureVector, OutcomeSet, PatientSnapshot, RiskAssessment};
use tracing::debug;

/// Extract the ten normalized risk features from a snapshot.
pub fn extract_features(snapshot: &PatientSnapshot) -> FeatureVector {
    FeatureExtractor::extract(snapshot)
}

/// Relapse probability for a feature vector under the given weights and the
/// default centering offset.
///
/// Both arguments are keyed by [`crate::types::FeatureName`], so a key-set
/// mismatch is caught when either is built from an untyped map.
pub fn compute_relapse_probability(features: &FeatureVector, weights: &WeightTable) -> f64 {
    RiskCalibrator::with_weights(weights).relapse_probability(features)
}

/// Estimate outcomes with the default configuration.
pub fn estimate_outcomes(snapshot: &PatientSnapshot) -> OutcomeSet {
    let config = PredictorConfig::default();
    run_outcomes(&config, snapshot)
}

/// Compare AI-monitored outcomes with routine follow-up using the default
/// configuration.
pub fn compare_with_routine_followup(snapshot: &PatientSnapshot) -> ComparisonSet {
    let config = PredictorConfig::default();
    let outcomes = run_outcomes(&config, snapshot);
    BaselineComparator::new(&config.routine_care).compare(&outcomes)
}

/// Convert a snapshot JSON document to an assessment JSON document
/// (stateless, one-shot, default configuration).
///
/// # Example
/// ```ignore
/// let assessment_json = snapshot_to_assessment_json(snapshot_json)?;
/// ```
pub fn snapshot_to_assessment_json(snapshot_json: String) -> Result<String, RelapseError> {
    RelapsePredictor::new().assess_json(&snapshot_json)
}

/// Stages 1-3: features, calibrated probability, outcomes
fn run_outcomes(config: &PredictorConfig, snapshot: &PatientSnapshot) -> OutcomeSet {
    let features = FeatureExtractor::extract(snapshot);
    let relapse_risk = RiskCalibrator::new(&config.calibration).relapse_probability(&features);
    OutcomeEstimator::new(&config.outcomes).estimate(snapshot, features, relapse_risk)
}

/// Predictor holding an immutable configuration.
///
/// All methods take `&self`; one predictor can serve any number of threads.
#[derive(Debug, Clone)]
pub struct RelapsePredictor {
    config: PredictorConfig,
    encoder: AssessmentEncoder,
}

impl Default for RelapsePredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl RelapsePredictor {
    /// Create a predictor with the baseline constants
    pub fn new() -> Self {
        Self::with_config(PredictorConfig::default())
    }

    pub fn with_config(config: PredictorConfig) -> Self {
        Self {
            config,
            encoder: AssessmentEncoder::new(),
        }
    }

    /// Create a predictor from a JSON configuration document
    pub fn from_config_json(json: &str) -> Result<Self, RelapseError> {
        Ok(Self::with_config(PredictorConfig::from_json(json)?))
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn extract_features(&self, snapshot: &PatientSnapshot) -> FeatureVector {
        FeatureExtractor::extract(snapshot)
    }

    pub fn relapse_probability(&self, features: &FeatureVector) -> f64 {
        RiskCalibrator::new(&self.config.calibration).relapse_probability(features)
    }

    pub fn estimate_outcomes(&self, snapshot: &PatientSnapshot) -> OutcomeSet {
        run_outcomes(&self.config, snapshot)
    }

    pub fn compare_with_routine_followup(&self, snapshot: &PatientSnapshot) -> ComparisonSet {
        let outcomes = self.estimate_outcomes(snapshot);
        BaselineComparator::new(&self.config.routine_care).compare(&outcomes)
    }

    /// Run the full pipeline and wrap the result for reporting
    pub fn assess(&self, snapshot: &PatientSnapshot) -> RiskAssessment {
        let outcomes = self.estimate_outcomes(snapshot);
        let comparison = BaselineComparator::new(&self.config.routine_care).compare(&outcomes);

        let assessment = self.encoder.encode(
            outcomes,
            comparison,
            self.config.outcomes.false_alarm_threshold,
        );
        debug!(
            instance_id = self.encoder.instance_id(),
            risk_band = assessment.risk_band.as_str(),
            "assessment complete"
        );
        assessment
    }

    /// Assess one snapshot JSON document and return the assessment as JSON
    pub fn assess_json(&self, snapshot_json: &str) -> Result<String, RelapseError> {
        let snapshot = parse_snapshot(snapshot_json)?;
        let assessment = self.assess(&snapshot);
        Ok(serde_json::to_string_pretty(&assessment)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskBand;
    use pretty_assertions::assert_eq;

    /// Snapshot whose only risk signals are full nonadherence, a full
    /// disorganization rise, and the given circadian shift.
    fn make_threshold_snapshot(circadian_shift_hours: f64) -> PatientSnapshot {
        PatientSnapshot {
            baseline_speech_rate_wpm: 120.0,
            current_speech_rate_wpm: 120.0,
            baseline_pause_seconds: 1.0,
            current_pause_seconds: 1.0,
            baseline_emotion_valence: 0.2,
            current_emotion_valence: 0.2,
            baseline_disorganization: 0.0,
            current_disorganization: 1.0,
            baseline_sleep_hours: 7.5,
            current_sleep_hours: 7.5,
            sleep_variability_hours: 0.0,
            baseline_activity_steps: 8000.0,
            current_activity_steps: 8000.0,
            circadian_shift_hours,
            medication_adherence_ratio: 0.0,
            missed_followup_ratio: 0.0,
            baseline_daily_messages: 20.0,
            current_daily_messages: 20.0,
        }
    }

    #[test]
    fn test_demo_patient_end_to_end() {
        let outcomes = estimate_outcomes(&PatientSnapshot::demo());

        assert!((outcomes.relapse_risk_6_12m - 0.782060).abs() < 1e-5);
        assert!((outcomes.readmission_risk - 0.643084).abs() < 1e-5);
        assert!((outcomes.early_intervention_window_days - 13.076373).abs() < 1e-4);
        assert!((outcomes.predicted_medication_adherence_3m - 0.539485).abs() < 1e-5);
        assert_eq!(outcomes.estimated_false_alarm_rate, 0.18);

        assert!(outcomes.relapse_risk_6_12m > 0.0 && outcomes.relapse_risk_6_12m < 1.0);
        assert!((0.0..=1.0).contains(&outcomes.readmission_risk));
        assert!((0.0..=1.0).contains(&outcomes.predicted_medication_adherence_3m));
        assert!(outcomes.early_intervention_window_days >= 3.0);
    }

    #[test]
    fn test_demo_patient_comparison() {
        let comparison = compare_with_routine_followup(&PatientSnapshot::demo());

        assert!((comparison.routine_relapse_risk_6_12m - 0.862060).abs() < 1e-5);
        assert!((comparison.routine_readmission_risk - 0.763084).abs() < 1e-5);
        // 13.08 - 14 falls below the 1-day floor
        assert_eq!(comparison.routine_early_intervention_window_days, 1.0);
        assert_eq!(comparison.ai_estimated_false_alarm_rate, 0.18);
    }

    #[test]
    fn test_false_alarm_rate_straddles_threshold() {
        // logit = 1.5 + 1.4 + |shift|/4 - 3.5
        let below = estimate_outcomes(&make_threshold_snapshot(3.18));
        let above = estimate_outcomes(&make_threshold_snapshot(3.23));

        assert!(below.relapse_risk_6_12m > 0.545 && below.relapse_risk_6_12m < 0.55);
        assert!(above.relapse_risk_6_12m > 0.55 && above.relapse_risk_6_12m < 0.555);
        assert_eq!(below.estimated_false_alarm_rate, 0.10);
        assert_eq!(above.estimated_false_alarm_rate, 0.18);
    }

    #[test]
    fn test_free_functions_match_predictor() {
        let snapshot = PatientSnapshot::demo();
        let predictor = RelapsePredictor::new();

        let features = extract_features(&snapshot);
        assert_eq!(predictor.extract_features(&snapshot), features);
        assert_eq!(
            compute_relapse_probability(&features, &WeightTable::default()),
            predictor.relapse_probability(&features)
        );
        assert_eq!(predictor.estimate_outcomes(&snapshot), estimate_outcomes(&snapshot));
        assert_eq!(
            predictor.compare_with_routine_followup(&snapshot),
            compare_with_routine_followup(&snapshot)
        );
    }

    #[test]
    fn test_custom_config_changes_operating_point() {
        let predictor = RelapsePredictor::from_config_json(
            r#"{ "outcomes": { "false_alarm_threshold": 0.9 } }"#,
        )
        .unwrap();

        let assessment = predictor.assess(&PatientSnapshot::demo());
        assert_eq!(assessment.outcomes.estimated_false_alarm_rate, 0.10);
        assert_eq!(assessment.risk_band, RiskBand::Moderate);
    }

    #[test]
    fn test_assess_json() {
        let snapshot_json = serde_json::to_string(&PatientSnapshot::demo()).unwrap();
        let json = snapshot_to_assessment_json(snapshot_json).unwrap();

        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(payload["producer"]["name"], "jiwa-relapse");
        assert_eq!(payload["risk_band"], "high");
        assert_eq!(payload["outcomes"]["estimated_false_alarm_rate"], 0.18);
        assert_eq!(payload["comparison"]["routine_early_intervention_window_days"], 1.0);
    }

    #[test]
    fn test_assess_json_missing_field() {
        let result = RelapsePredictor::new().assess_json(r#"{ "baseline_speech_rate_wpm": 120 }"#);
        assert!(matches!(result, Err(RelapseError::ParseError(_))));
    }

    #[test]
    fn test_invalid_json() {
        let result = snapshot_to_assessment_json("not valid json".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_predictor_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RelapsePredictor>();

        let predictor = std::sync::Arc::new(RelapsePredictor::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let predictor = std::sync::Arc::clone(&predictor);
                std::thread::spawn(move || {
                    let mut snapshot = PatientSnapshot::demo();
                    snapshot.circadian_shift_hours = i as f64;
                    predictor.estimate_outcomes(&snapshot).relapse_risk_6_12m
                })
            })
            .collect();

        for handle in handles {
            let risk = handle.join().unwrap();
            assert!(risk > 0.0 && risk < 1.0);
        }
    }
}
