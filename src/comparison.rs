//! Routine-care comparison
//!
//! Builds the "routine follow-up, no AI monitoring" counterfactual by applying
//! fixed deltas to the AI-monitored outcomes. Routine care is assumed to detect
//! deterioration later, so it never comes out ahead.

use crate::config::RoutineCareConfig;
use crate::types::{ComparisonSet, OutcomeSet};

/// Comparator applying the routine-care deltas
#[derive(Debug, Clone, Copy)]
pub struct BaselineComparator<'a> {
    config: &'a RoutineCareConfig,
}

impl<'a> BaselineComparator<'a> {
    pub fn new(config: &'a RoutineCareConfig) -> Self {
        Self { config }
    }

    pub fn compare(&self, ai: &OutcomeSet) -> ComparisonSet {
        let routine_relapse_risk =
            (ai.relapse_risk_6_12m + self.config.relapse_delta).clamp(0.0, 1.0);
        let routine_readmission_risk =
            (ai.readmission_risk + self.config.readmission_delta).clamp(0.0, 1.0);
        let routine_window_days = (ai.early_intervention_window_days
            - self.config.detection_lag_days)
            .max(self.config.window_floor_days);

        ComparisonSet {
            ai_relapse_risk_6_12m: ai.relapse_risk_6_12m,
            routine_relapse_risk_6_12m: routine_relapse_risk,
            ai_readmission_risk: ai.readmission_risk,
            routine_readmission_risk,
            ai_early_intervention_window_days: ai.early_intervention_window_days,
            routine_early_intervention_window_days: routine_window_days,
            ai_estimated_false_alarm_rate: ai.estimated_false_alarm_rate,
        }
    }
}
