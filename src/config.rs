//! Predictor configuration
//!
//! All scoring constants live here as named, immutable structures. Defaults
//! reproduce the documented baseline model; a JSON file may override any
//! subset of them.
//!
//! The routine-care deltas and the false-alarm operating point are
//! illustrative placeholders with no empirical calibration behind them.

use crate::error::RelapseError;
use crate::types::{check_key_set, FeatureName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Centering offset subtracted from the weighted score before the logistic
pub const DEFAULT_CALIBRATION_OFFSET: f64 = 3.5;

/// Lowest allowed AI-monitoring intervention window (days)
pub const MIN_INTERVENTION_WINDOW_DAYS: f64 = 3.0;

/// Lowest allowed routine-care intervention window (days)
pub const MIN_ROUTINE_WINDOW_DAYS: f64 = 1.0;

/// Baseline weights in canonical feature order
const DEFAULT_WEIGHTS: [f64; 10] = [
    1.1, // speech_rate_shift
    0.6, // pause_change
    1.2, // emotion_valence_drop
    1.4, // language_disorganization_rise
    1.1, // sleep_deviation
    0.9, // sleep_irregularity
    0.7, // activity_shift
    1.0, // circadian_disruption
    1.5, // medication_nonadherence
    0.8, // digital_withdrawal
];

/// Positive per-feature weights.
///
/// The table is keyed by [`FeatureName`], so every feature always has exactly
/// one weight. Untyped maps (config files) go through `TryFrom`, which rejects
/// missing or unknown keys and non-positive weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, f64>",
    into = "BTreeMap<String, f64>"
)]
pub struct WeightTable {
    values: [f64; 10],
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            values: DEFAULT_WEIGHTS,
        }
    }
}

impl WeightTable {
    pub fn get(&self, name: FeatureName) -> f64 {
        self.values[name.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureName, f64)> + '_ {
        FeatureName::ALL
            .into_iter()
            .map(move |name| (name, self.get(name)))
    }
}

impl TryFrom<BTreeMap<String, f64>> for WeightTable {
    type Error = RelapseError;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        check_key_set(&map)?;

        let mut values = [0.0; 10];
        for (key, value) in map {
            if !value.is_finite() || value <= 0.0 {
                return Err(RelapseError::InvalidWeight {
                    feature: key,
                    value,
                });
            }
            let name: FeatureName = key.parse()?;
            values[name.index()] = value;
        }
        Ok(Self { values })
    }
}

impl From<WeightTable> for BTreeMap<String, f64> {
    fn from(table: WeightTable) -> Self {
        table
            .iter()
            .map(|(name, weight)| (name.as_str().to_string(), weight))
            .collect()
    }
}

/// Weighted-sum + logistic calibration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub weights: WeightTable,
    pub offset: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            weights: WeightTable::default(),
            offset: DEFAULT_CALIBRATION_OFFSET,
        }
    }
}

/// Constants for deriving secondary outcomes from the relapse probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeConfig {
    pub readmission_slope: f64,
    pub readmission_intercept: f64,
    pub window_scale_days: f64,
    pub window_floor_days: f64,
    pub adherence_risk_penalty: f64,
    pub adherence_followup_penalty: f64,
    /// Relapse risk above which the sensitive operating point applies
    pub false_alarm_threshold: f64,
    pub sensitive_false_alarm_rate: f64,
    pub specific_false_alarm_rate: f64,
}

impl Default for OutcomeConfig {
    fn default() -> Self {
        Self {
            readmission_slope: 0.72,
            readmission_intercept: 0.08,
            window_scale_days: 60.0,
            window_floor_days: 3.0,
            adherence_risk_penalty: 0.25,
            adherence_followup_penalty: 0.15,
            false_alarm_threshold: 0.55,
            sensitive_false_alarm_rate: 0.18,
            specific_false_alarm_rate: 0.10,
        }
    }
}

/// Fixed deltas describing routine follow-up without AI monitoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutineCareConfig {
    pub relapse_delta: f64,
    pub readmission_delta: f64,
    pub detection_lag_days: f64,
    pub window_floor_days: f64,
}

impl Default for RoutineCareConfig {
    fn default() -> Self {
        Self {
            relapse_delta: 0.08,
            readmission_delta: 0.12,
            detection_lag_days: 14.0,
            window_floor_days: 1.0,
        }
    }
}

/// Full predictor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub calibration: CalibrationConfig,
    pub outcomes: OutcomeConfig,
    pub routine_care: RoutineCareConfig,
}

impl PredictorConfig {
    /// Load a configuration from JSON; omitted sections keep their defaults.
    ///
    /// The parsed configuration must pass [`PredictorConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, RelapseError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| RelapseError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every constant against the bounds the pipeline relies on.
    ///
    /// Rates and thresholds lie in 0-1, deltas and penalties are non-negative,
    /// the AI window floor is at least 3 days and the routine floor sits
    /// between 1 day and the AI floor, so routine care never comes out ahead.
    pub fn validate(&self) -> Result<(), RelapseError> {
        const ANY: (f64, f64) = (f64::NEG_INFINITY, f64::INFINITY);
        const UNIT: (f64, f64) = (0.0, 1.0);
        const NON_NEGATIVE: (f64, f64) = (0.0, f64::INFINITY);

        let outcomes = &self.outcomes;
        let routine = &self.routine_care;

        let checks = [
            ("calibration.offset", self.calibration.offset, ANY),
            ("outcomes.readmission_slope", outcomes.readmission_slope, NON_NEGATIVE),
            ("outcomes.readmission_intercept", outcomes.readmission_intercept, UNIT),
            ("outcomes.window_scale_days", outcomes.window_scale_days, NON_NEGATIVE),
            (
                "outcomes.window_floor_days",
                outcomes.window_floor_days,
                (MIN_INTERVENTION_WINDOW_DAYS, f64::INFINITY),
            ),
            ("outcomes.adherence_risk_penalty", outcomes.adherence_risk_penalty, NON_NEGATIVE),
            (
                "outcomes.adherence_followup_penalty",
                outcomes.adherence_followup_penalty,
                NON_NEGATIVE,
            ),
            ("outcomes.false_alarm_threshold", outcomes.false_alarm_threshold, UNIT),
            ("outcomes.sensitive_false_alarm_rate", outcomes.sensitive_false_alarm_rate, UNIT),
            ("outcomes.specific_false_alarm_rate", outcomes.specific_false_alarm_rate, UNIT),
            ("routine_care.relapse_delta", routine.relapse_delta, NON_NEGATIVE),
            ("routine_care.readmission_delta", routine.readmission_delta, NON_NEGATIVE),
            ("routine_care.detection_lag_days", routine.detection_lag_days, NON_NEGATIVE),
            (
                "routine_care.window_floor_days",
                routine.window_floor_days,
                (MIN_ROUTINE_WINDOW_DAYS, outcomes.window_floor_days),
            ),
        ];

        for (field, value, (min, max)) in checks {
            if !value.is_finite() || value < min || value > max {
                return Err(RelapseError::ConfigError(format!(
                    "{field} = {value} is outside [{min}, {max}]"
                )));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, RelapseError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_weights() {
        let weights = WeightTable::default();
        assert_eq!(weights.get(FeatureName::MedicationNonadherence), 1.5);
        assert_eq!(weights.get(FeatureName::LanguageDisorganizationRise), 1.4);
        assert_eq!(weights.get(FeatureName::PauseChange), 0.6);
        assert!((weights.iter().map(|(_, w)| w).sum::<f64>() - 10.3).abs() < 1e-9);
    }

    #[test]
    fn test_weights_serialize_by_name() {
        let json = serde_json::to_value(WeightTable::default()).unwrap();
        assert_eq!(json["digital_withdrawal"], 0.8);
        assert_eq!(json.as_object().unwrap().len(), 10);
    }

    #[test]
    fn test_weight_table_rejects_missing_key() {
        let mut map: BTreeMap<String, f64> = WeightTable::default().into();
        map.remove("sleep_irregularity");

        match WeightTable::try_from(map) {
            Err(RelapseError::KeySetMismatch { missing, unexpected }) => {
                assert_eq!(missing, vec!["sleep_irregularity".to_string()]);
                assert!(unexpected.is_empty());
            }
            other => panic!("expected key set mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_weight_table_rejects_non_positive_weight() {
        let mut map: BTreeMap<String, f64> = WeightTable::default().into();
        map.insert("activity_shift".to_string(), 0.0);

        assert!(matches!(
            WeightTable::try_from(map),
            Err(RelapseError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config =
            PredictorConfig::from_json(r#"{ "outcomes": { "false_alarm_threshold": 0.6 } }"#)
                .unwrap();

        assert_eq!(config.outcomes.false_alarm_threshold, 0.6);
        assert_eq!(config.outcomes.sensitive_false_alarm_rate, 0.18);
        assert_eq!(config.calibration, CalibrationConfig::default());
        assert_eq!(config.routine_care, RoutineCareConfig::default());
    }

    #[test]
    fn test_config_with_incomplete_weights_fails() {
        let result = PredictorConfig::from_json(
            r#"{ "calibration": { "weights": { "speech_rate_shift": 1.0 } } }"#,
        );

        match result {
            Err(RelapseError::ConfigError(msg)) => assert!(msg.contains("mismatch")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    fn assert_rejected(json: &str, field: &str) {
        match PredictorConfig::from_json(json) {
            Err(RelapseError::ConfigError(msg)) => assert!(msg.contains(field), "{msg}"),
            other => panic!("expected config error for {field}, got {other:?}"),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(PredictorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_negative_routine_delta_rejected() {
        assert_rejected(
            r#"{ "routine_care": { "relapse_delta": -0.5 } }"#,
            "routine_care.relapse_delta",
        );
        assert_rejected(
            r#"{ "routine_care": { "readmission_delta": -0.1 } }"#,
            "routine_care.readmission_delta",
        );
        assert_rejected(
            r#"{ "routine_care": { "detection_lag_days": -14 } }"#,
            "routine_care.detection_lag_days",
        );
    }

    #[test]
    fn test_rates_and_threshold_must_be_probabilities() {
        assert_rejected(
            r#"{ "outcomes": { "sensitive_false_alarm_rate": 3.0 } }"#,
            "outcomes.sensitive_false_alarm_rate",
        );
        assert_rejected(
            r#"{ "outcomes": { "specific_false_alarm_rate": -0.1 } }"#,
            "outcomes.specific_false_alarm_rate",
        );
        assert_rejected(
            r#"{ "outcomes": { "false_alarm_threshold": 1.2 } }"#,
            "outcomes.false_alarm_threshold",
        );
        assert_rejected(
            r#"{ "outcomes": { "readmission_intercept": 1.5 } }"#,
            "outcomes.readmission_intercept",
        );
    }

    #[test]
    fn test_window_floors_enforced() {
        assert_rejected(
            r#"{ "outcomes": { "window_floor_days": -10 } }"#,
            "outcomes.window_floor_days",
        );
        assert_rejected(
            r#"{ "outcomes": { "window_floor_days": 2.5 } }"#,
            "outcomes.window_floor_days",
        );
        assert_rejected(
            r#"{ "routine_care": { "window_floor_days": 0 } }"#,
            "routine_care.window_floor_days",
        );
        // Routine floor above the AI floor would let routine care win
        assert_rejected(
            r#"{ "routine_care": { "window_floor_days": 5 } }"#,
            "routine_care.window_floor_days",
        );
    }

    #[test]
    fn test_negative_slopes_and_penalties_rejected() {
        assert_rejected(
            r#"{ "outcomes": { "readmission_slope": -0.72 } }"#,
            "outcomes.readmission_slope",
        );
        assert_rejected(
            r#"{ "outcomes": { "window_scale_days": -60 } }"#,
            "outcomes.window_scale_days",
        );
        assert_rejected(
            r#"{ "outcomes": { "adherence_risk_penalty": -0.25 } }"#,
            "outcomes.adherence_risk_penalty",
        );
        assert_rejected(
            r#"{ "outcomes": { "adherence_followup_penalty": -0.15 } }"#,
            "outcomes.adherence_followup_penalty",
        );
    }

    #[test]
    fn test_non_finite_offset_rejected() {
        let mut config = PredictorConfig::default();
        config.calibration.offset = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(RelapseError::ConfigError(msg)) if msg.contains("calibration.offset")
        ));

        config.calibration.offset = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_raised_floors_accepted() {
        let config = PredictorConfig::from_json(
            r#"{ "outcomes": { "window_floor_days": 7 }, "routine_care": { "window_floor_days": 5 } }"#,
        )
        .unwrap();
        assert_eq!(config.routine_care.window_floor_days, 5.0);
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = PredictorConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(PredictorConfig::from_json(&json).unwrap(), config);
    }
}
