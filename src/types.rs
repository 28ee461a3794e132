//! Core types for the Jiwa scoring pipeline
//!
//! This module defines the records that flow through each stage of the
//! pipeline: the raw patient snapshot, the normalized feature vector, the
//! outcome set, the routine-care comparison and the reporting envelope.

use crate::error::RelapseError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The ten digital-phenotyping risk features, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureName {
    SpeechRateShift,
    PauseChange,
    EmotionValenceDrop,
    LanguageDisorganizationRise,
    SleepDeviation,
    SleepIrregularity,
    ActivityShift,
    CircadianDisruption,
    MedicationNonadherence,
    DigitalWithdrawal,
}

impl FeatureName {
    /// All features in canonical order (linguistic, behavioral, clinical, engagement)
    pub const ALL: [FeatureName; 10] = [
        FeatureName::SpeechRateShift,
        FeatureName::PauseChange,
        FeatureName::EmotionValenceDrop,
        FeatureName::LanguageDisorganizationRise,
        FeatureName::SleepDeviation,
        FeatureName::SleepIrregularity,
        FeatureName::ActivityShift,
        FeatureName::CircadianDisruption,
        FeatureName::MedicationNonadherence,
        FeatureName::DigitalWithdrawal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureName::SpeechRateShift => "speech_rate_shift",
            FeatureName::PauseChange => "pause_change",
            FeatureName::EmotionValenceDrop => "emotion_valence_drop",
            FeatureName::LanguageDisorganizationRise => "language_disorganization_rise",
            FeatureName::SleepDeviation => "sleep_deviation",
            FeatureName::SleepIrregularity => "sleep_irregularity",
            FeatureName::ActivityShift => "activity_shift",
            FeatureName::CircadianDisruption => "circadian_disruption",
            FeatureName::MedicationNonadherence => "medication_nonadherence",
            FeatureName::DigitalWithdrawal => "digital_withdrawal",
        }
    }

    /// Position of this feature in [`FeatureName::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureName {
    type Err = RelapseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| RelapseError::UnknownFeature(s.to_string()))
    }
}

/// Check that a name-keyed map covers exactly the ten features.
pub(crate) fn check_key_set(map: &BTreeMap<String, f64>) -> Result<(), RelapseError> {
    let missing: Vec<String> = FeatureName::ALL
        .iter()
        .filter(|name| !map.contains_key(name.as_str()))
        .map(|name| name.as_str().to_string())
        .collect();

    let unexpected: Vec<String> = map
        .keys()
        .filter(|key| key.parse::<FeatureName>().is_err())
        .cloned()
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        Ok(())
    } else {
        Err(RelapseError::KeySetMismatch {
            missing,
            unexpected,
        })
    }
}

/// One patient's current vs. baseline measurements.
///
/// Values are taken as given: the scoring core does not check clinical
/// plausibility (see [`crate::intake`] for boundary validation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientSnapshot {
    // Linguistic (chat / voice notes)
    /// Baseline speech rate (words per minute)
    pub baseline_speech_rate_wpm: f64,
    /// Current speech rate (words per minute)
    pub current_speech_rate_wpm: f64,
    /// Baseline mean pause duration (seconds)
    pub baseline_pause_seconds: f64,
    /// Current mean pause duration (seconds)
    pub current_pause_seconds: f64,
    /// Baseline emotional valence (-1 negative to +1 positive)
    pub baseline_emotion_valence: f64,
    /// Current emotional valence (-1 to +1)
    pub current_emotion_valence: f64,
    /// Baseline language disorganization (0 structured to 1 very disorganized)
    pub baseline_disorganization: f64,
    /// Current language disorganization (0-1)
    pub current_disorganization: f64,

    // Behavioral (sleep / activity)
    /// Baseline sleep duration (hours)
    pub baseline_sleep_hours: f64,
    /// Current sleep duration (hours)
    pub current_sleep_hours: f64,
    /// Standard deviation of sleep duration over 14 days (hours)
    pub sleep_variability_hours: f64,
    /// Baseline daily step count
    pub baseline_activity_steps: f64,
    /// Current daily step count
    pub current_activity_steps: f64,
    /// Sleep-midpoint shift relative to baseline (hours, signed)
    pub circadian_shift_hours: f64,

    // Clinical
    /// Medication adherence ratio (0-1)
    pub medication_adherence_ratio: f64,
    /// Ratio of missed follow-up appointments (0-1)
    pub missed_followup_ratio: f64,

    // Digital engagement
    /// Baseline daily message count
    pub baseline_daily_messages: f64,
    /// Current daily message count
    pub current_daily_messages: f64,
}

impl PatientSnapshot {
    /// Reference case: a stabilized patient showing early signs of a manic
    /// shift (pressured speech, short sleep, reduced engagement).
    pub fn demo() -> Self {
        Self {
            baseline_speech_rate_wpm: 120.0,
            current_speech_rate_wpm: 165.0,
            baseline_pause_seconds: 1.2,
            current_pause_seconds: 0.5,
            baseline_emotion_valence: 0.1,
            current_emotion_valence: -0.4,
            baseline_disorganization: 0.22,
            current_disorganization: 0.55,
            baseline_sleep_hours: 7.0,
            current_sleep_hours: 4.5,
            sleep_variability_hours: 2.1,
            baseline_activity_steps: 7000.0,
            current_activity_steps: 3200.0,
            circadian_shift_hours: 2.8,
            medication_adherence_ratio: 0.78,
            missed_followup_ratio: 0.30,
            baseline_daily_messages: 35.0,
            current_daily_messages: 12.0,
        }
    }
}

/// Normalized risk features, each in 0-1.
///
/// Serialized as a name-keyed map; deserialization goes through the same
/// key-set and range checks as `TryFrom<BTreeMap>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, f64>",
    into = "BTreeMap<String, f64>"
)]
pub struct FeatureVector {
    pub speech_rate_shift: f64,
    pub pause_change: f64,
    pub emotion_valence_drop: f64,
    pub language_disorganization_rise: f64,
    pub sleep_deviation: f64,
    pub sleep_irregularity: f64,
    pub activity_shift: f64,
    pub circadian_disruption: f64,
    pub medication_nonadherence: f64,
    pub digital_withdrawal: f64,
}

impl FeatureVector {
    pub fn get(&self, name: FeatureName) -> f64 {
        match name {
            FeatureName::SpeechRateShift => self.speech_rate_shift,
            FeatureName::PauseChange => self.pause_change,
            FeatureName::EmotionValenceDrop => self.emotion_valence_drop,
            FeatureName::LanguageDisorganizationRise => self.language_disorganization_rise,
            FeatureName::SleepDeviation => self.sleep_deviation,
            FeatureName::SleepIrregularity => self.sleep_irregularity,
            FeatureName::ActivityShift => self.activity_shift,
            FeatureName::CircadianDisruption => self.circadian_disruption,
            FeatureName::MedicationNonadherence => self.medication_nonadherence,
            FeatureName::DigitalWithdrawal => self.digital_withdrawal,
        }
    }

    /// Copy of this vector with one feature replaced
    pub fn with_value(mut self, name: FeatureName, value: f64) -> Self {
        let slot = match name {
            FeatureName::SpeechRateShift => &mut self.speech_rate_shift,
            FeatureName::PauseChange => &mut self.pause_change,
            FeatureName::EmotionValenceDrop => &mut self.emotion_valence_drop,
            FeatureName::LanguageDisorganizationRise => &mut self.language_disorganization_rise,
            FeatureName::SleepDeviation => &mut self.sleep_deviation,
            FeatureName::SleepIrregularity => &mut self.sleep_irregularity,
            FeatureName::ActivityShift => &mut self.activity_shift,
            FeatureName::CircadianDisruption => &mut self.circadian_disruption,
            FeatureName::MedicationNonadherence => &mut self.medication_nonadherence,
            FeatureName::DigitalWithdrawal => &mut self.digital_withdrawal,
        };
        *slot = value;
        self
    }

    /// Iterate `(name, value)` pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (FeatureName, f64)> + '_ {
        FeatureName::ALL.into_iter().map(move |name| (name, self.get(name)))
    }
}

/// Build a vector from an untyped name-keyed map.
///
/// Fails when the key set is not exactly the ten feature names or when any
/// value lies outside 0-1.
impl TryFrom<BTreeMap<String, f64>> for FeatureVector {
    type Error = RelapseError;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        check_key_set(&map)?;

        let mut vector = FeatureVector::default();
        for (key, value) in map {
            if !(0.0..=1.0).contains(&value) {
                return Err(RelapseError::FeatureOutOfRange {
                    feature: key,
                    value,
                });
            }
            vector = vector.with_value(key.parse::<FeatureName>()?, value);
        }
        Ok(vector)
    }
}

impl From<FeatureVector> for BTreeMap<String, f64> {
    fn from(vector: FeatureVector) -> Self {
        vector
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), value))
            .collect()
    }
}

/// Outcome estimates derived from the relapse probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSet {
    /// Calibrated relapse probability over 6-12 months (0-1, exclusive)
    pub relapse_risk_6_12m: f64,
    /// Readmission risk (0-1)
    pub readmission_risk: f64,
    /// Safe monitoring window before intervention (days, at least the floor)
    pub early_intervention_window_days: f64,
    /// Forecast medication adherence over the next 3 months (0-1)
    pub predicted_medication_adherence_3m: f64,
    /// Expected false-alarm rate at the active operating point (0-1)
    pub estimated_false_alarm_rate: f64,
    /// Features the estimate was computed from
    pub features: FeatureVector,
}

/// AI-monitored outcomes paired with the routine-care counterfactual
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSet {
    pub ai_relapse_risk_6_12m: f64,
    pub routine_relapse_risk_6_12m: f64,
    pub ai_readmission_risk: f64,
    pub routine_readmission_risk: f64,
    pub ai_early_intervention_window_days: f64,
    pub routine_early_intervention_window_days: f64,
    pub ai_estimated_false_alarm_rate: f64,
}

/// Coarse triage band for a relapse probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Low => "low",
            RiskBand::Moderate => "moderate",
            RiskBand::High => "high",
        }
    }
}

/// Producer metadata attached to every assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Complete assessment payload handed to the reporting layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub producer: AssessmentProducer,
    pub computed_at_utc: String,
    pub risk_band: RiskBand,
    pub outcomes: OutcomeSet,
    pub comparison: ComparisonSet,
}
