//! Feature extraction
//!
//! This module maps a raw patient snapshot to ten normalized risk features:
//! - Linguistic: speech rate, pauses, valence, disorganization
//! - Behavioral: sleep deviation and irregularity, activity, circadian shift
//! - Clinical: medication nonadherence
//! - Engagement: digital withdrawal
//!
//! Every feature depends only on snapshot fields and is clamped to 0-1.

use crate::types::{FeatureVector, PatientSnapshot};
use tracing::debug;

/// Sleep-duration change (hours) treated as full-scale deviation
const SLEEP_DEVIATION_FULL_SCALE_HOURS: f64 = 4.0;

/// 14-day sleep SD (hours) treated as full-scale irregularity
const SLEEP_IRREGULARITY_FULL_SCALE_HOURS: f64 = 3.0;

/// Sleep-midpoint shift (hours) treated as full-scale disruption
const CIRCADIAN_FULL_SCALE_HOURS: f64 = 4.0;

/// Widest possible valence drop (from +1 to -1)
const VALENCE_RANGE: f64 = 2.0;

/// Feature extractor for turning snapshots into feature vectors
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Extract the ten risk features from a snapshot
    pub fn extract(snapshot: &PatientSnapshot) -> FeatureVector {
        let features = FeatureVector {
            speech_rate_shift: compute_speech_rate_shift(snapshot),
            pause_change: compute_pause_change(snapshot),
            emotion_valence_drop: compute_emotion_valence_drop(snapshot),
            language_disorganization_rise: compute_language_disorganization_rise(snapshot),
            sleep_deviation: compute_sleep_deviation(snapshot),
            sleep_irregularity: compute_sleep_irregularity(snapshot),
            activity_shift: compute_activity_shift(snapshot),
            circadian_disruption: compute_circadian_disruption(snapshot),
            medication_nonadherence: compute_medication_nonadherence(snapshot),
            digital_withdrawal: compute_digital_withdrawal(snapshot),
        };

        debug!(?features, "features extracted");
        features
    }
}

/// Relative change `|current - baseline| / |baseline|`.
///
/// Returns 0.0 when the baseline is exactly zero.
pub fn relative_change(current: f64, baseline: f64) -> f64 {
    if baseline == 0.0 {
        return 0.0;
    }
    (current - baseline).abs() / baseline.abs()
}

fn bounded(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Speech rate shift: relative change in words per minute
fn compute_speech_rate_shift(p: &PatientSnapshot) -> f64 {
    bounded(relative_change(
        p.current_speech_rate_wpm,
        p.baseline_speech_rate_wpm,
    ))
}

/// Pause change: relative change in mean pause duration
fn compute_pause_change(p: &PatientSnapshot) -> f64 {
    bounded(relative_change(
        p.current_pause_seconds,
        p.baseline_pause_seconds,
    ))
}

/// Emotion valence drop
///
/// Formula: `max(0, baseline - current) / 2`
/// Only a drop counts; a brighter mood contributes nothing.
fn compute_emotion_valence_drop(p: &PatientSnapshot) -> f64 {
    bounded((p.baseline_emotion_valence - p.current_emotion_valence).max(0.0) / VALENCE_RANGE)
}

/// Language disorganization rise: `max(0, current - baseline)`
fn compute_language_disorganization_rise(p: &PatientSnapshot) -> f64 {
    bounded((p.current_disorganization - p.baseline_disorganization).max(0.0))
}

/// Sleep deviation: absolute change in hours, 4h = 1.0
fn compute_sleep_deviation(p: &PatientSnapshot) -> f64 {
    bounded((p.current_sleep_hours - p.baseline_sleep_hours).abs() / SLEEP_DEVIATION_FULL_SCALE_HOURS)
}

/// Sleep irregularity: 14-day SD, 3h = 1.0
fn compute_sleep_irregularity(p: &PatientSnapshot) -> f64 {
    bounded(p.sleep_variability_hours / SLEEP_IRREGULARITY_FULL_SCALE_HOURS)
}

/// Activity shift: relative change in daily steps (either direction)
fn compute_activity_shift(p: &PatientSnapshot) -> f64 {
    bounded(relative_change(
        p.current_activity_steps,
        p.baseline_activity_steps,
    ))
}

/// Circadian disruption: absolute midpoint shift, 4h = 1.0
fn compute_circadian_disruption(p: &PatientSnapshot) -> f64 {
    bounded(p.circadian_shift_hours.abs() / CIRCADIAN_FULL_SCALE_HOURS)
}

fn compute_medication_nonadherence(p: &PatientSnapshot) -> f64 {
    bounded(1.0 - p.medication_adherence_ratio)
}

/// Digital withdrawal
///
/// Formula: `max(0, baseline - current) / max(1, baseline)`
/// The denominator floor keeps near-silent baselines from dividing by zero.
fn compute_digital_withdrawal(p: &PatientSnapshot) -> f64 {
    let drop = (p.baseline_daily_messages - p.current_daily_messages).max(0.0);
    bounded(drop / p.baseline_daily_messages.max(1.0))
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::num::f64::{NORMAL, SUBNORMAL, ZERO};
    use proptest::prelude::*;

    /// Any finite value of either sign, including extremes near `f64::MAX`
    fn finite() -> proptest::num::f64::Any {
        NORMAL | SUBNORMAL | ZERO
    }

    prop_compose! {
        fn any_snapshot()(
            linguistic in proptest::array::uniform8(finite()),
            behavioral in proptest::array::uniform6(finite()),
            clinical in proptest::array::uniform2(finite()),
            engagement in proptest::array::uniform2(finite()),
        ) -> PatientSnapshot {
            PatientSnapshot {
                baseline_speech_rate_wpm: linguistic[0],
                current_speech_rate_wpm: linguistic[1],
                baseline_pause_seconds: linguistic[2],
                current_pause_seconds: linguistic[3],
                baseline_emotion_valence: linguistic[4],
                current_emotion_valence: linguistic[5],
                baseline_disorganization: linguistic[6],
                current_disorganization: linguistic[7],
                baseline_sleep_hours: behavioral[0],
                current_sleep_hours: behavioral[1],
                sleep_variability_hours: behavioral[2],
                baseline_activity_steps: behavioral[3],
                current_activity_steps: behavioral[4],
                circadian_shift_hours: behavioral[5],
                medication_adherence_ratio: clinical[0],
                missed_followup_ratio: clinical[1],
                baseline_daily_messages: engagement[0],
                current_daily_messages: engagement[1],
            }
        }
    }

    proptest! {
        /// Clamping is total: every feature lands in 0-1 for any finite input
        #[test]
        fn features_always_bounded(snapshot in any_snapshot()) {
            let features = FeatureExtractor::extract(&snapshot);
            for (name, value) in features.iter() {
                prop_assert!(
                    (0.0..=1.0).contains(&value),
                    "{} out of range: {}",
                    name,
                    value
                );
            }
        }

        /// A zero baseline never produces a relative change
        #[test]
        fn relative_change_zero_baseline_is_zero(current in proptest::num::f64::ANY) {
            prop_assert_eq!(relative_change(current, 0.0), 0.0);
        }
    }
}
