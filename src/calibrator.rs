//! Risk calibration
//!
//! Reduces a feature vector to one relapse probability:
//! `score = sum(feature * weight)`, `probability = logistic(score - offset)`.
//!
//! Weights and offset are hand-tuned constants, not learned. With the default
//! table the calibrated logit spans [-3.5, 6.8], so the result stays strictly
//! inside (0, 1).

use crate::config::{CalibrationConfig, WeightTable, DEFAULT_CALIBRATION_OFFSET};
use crate::types::FeatureVector;
use tracing::debug;

/// Standard logistic function `1 / (1 + e^-x)`
pub fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Calibrator borrowing an immutable weight table
#[derive(Debug, Clone, Copy)]
pub struct RiskCalibrator<'a> {
    weights: &'a WeightTable,
    offset: f64,
}

impl<'a> RiskCalibrator<'a> {
    pub fn new(config: &'a CalibrationConfig) -> Self {
        Self {
            weights: &config.weights,
            offset: config.offset,
        }
    }

    /// Calibrator using the given weights and the default centering offset
    pub fn with_weights(weights: &'a WeightTable) -> Self {
        Self {
            weights,
            offset: DEFAULT_CALIBRATION_OFFSET,
        }
    }

    /// Weighted sum of all ten features
    pub fn score(&self, features: &FeatureVector) -> f64 {
        features
            .iter()
            .map(|(name, value)| value * self.weights.get(name))
            .sum()
    }

    /// Relapse probability over the next 6-12 months
    pub fn relapse_probability(&self, features: &FeatureVector) -> f64 {
        let score = self.score(features);
        let calibrated = score - self.offset;
        let probability = logistic(calibrated);

        debug!(score, calibrated, probability, "relapse probability calibrated");
        probability
    }
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use crate::types::FeatureName;
    use proptest::prelude::*;

    fn any_features() -> impl Strategy<Value = FeatureVector> {
        proptest::array::uniform10(0.0..=1.0f64).prop_map(|values| {
            FeatureName::ALL
                .into_iter()
                .zip(values)
                .fold(FeatureVector::default(), |v, (name, value)| {
                    v.with_value(name, value)
                })
        })
    }

    proptest! {
        /// The logistic never saturates for in-range features
        #[test]
        fn probability_in_open_interval(features in any_features()) {
            let weights = WeightTable::default();
            let p = RiskCalibrator::with_weights(&weights).relapse_probability(&features);
            prop_assert!(p > 0.0 && p < 1.0, "probability saturated: {}", p);
        }

        /// Raising one feature never lowers the probability
        #[test]
        fn probability_monotone_in_each_feature(
            features in any_features(),
            index in 0usize..10,
            bump in 0.0..=1.0f64,
        ) {
            let weights = WeightTable::default();
            let calibrator = RiskCalibrator::with_weights(&weights);
            let name = FeatureName::ALL[index];

            let raised = (features.get(name) + bump).min(1.0);
            let before = calibrator.relapse_probability(&features);
            let after = calibrator.relapse_probability(&features.with_value(name, raised));

            prop_assert!(
                after >= before,
                "{} raised to {} lowered probability {} -> {}",
                name,
                raised,
                before,
                after
            );
        }
    }
}
