//! Assessment encoding
//!
//! This module wraps outcomes and the routine-care comparison into a
//! `RiskAssessment` envelope for the reporting layer, and renders the
//! plain-text console report.

use crate::types::{AssessmentProducer, ComparisonSet, OutcomeSet, RiskAssessment, RiskBand};
use crate::{JIWA_VERSION, PRODUCER_NAME};
use chrono::Utc;
use std::fmt;
use uuid::Uuid;

/// Relapse probability below which a patient is considered low risk
pub const LOW_RISK_CEILING: f64 = 0.30;

/// Encoder for producing assessment payloads
#[derive(Debug, Clone)]
pub struct AssessmentEncoder {
    instance_id: String,
}

impl Default for AssessmentEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AssessmentEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Wrap outcomes and comparison into an assessment.
    ///
    /// `high_risk_threshold` is the false-alarm operating point; risks strictly
    /// above it are banded high.
    pub fn encode(
        &self,
        outcomes: OutcomeSet,
        comparison: ComparisonSet,
        high_risk_threshold: f64,
    ) -> RiskAssessment {
        let producer = AssessmentProducer {
            name: PRODUCER_NAME.to_string(),
            version: JIWA_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        RiskAssessment {
            producer,
            computed_at_utc: Utc::now().to_rfc3339(),
            risk_band: risk_band(outcomes.relapse_risk_6_12m, high_risk_threshold),
            outcomes,
            comparison,
        }
    }
}

/// Triage band for a relapse probability
pub fn risk_band(relapse_risk: f64, high_risk_threshold: f64) -> RiskBand {
    if relapse_risk > high_risk_threshold {
        RiskBand::High
    } else if relapse_risk >= LOW_RISK_CEILING {
        RiskBand::Moderate
    } else {
        RiskBand::Low
    }
}

/// Three-section console report for an assessment
pub struct TextReport<'a>(pub &'a RiskAssessment);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcomes = &self.0.outcomes;
        let comparison = &self.0.comparison;

        writeln!(f, "=== Digital Phenotyping Features ===")?;
        for (name, value) in outcomes.features.iter() {
            writeln!(f, "- {name}: {value:.3}")?;
        }

        writeln!(f, "\n=== AI Monitoring Outcomes ===")?;
        write_rows(
            f,
            &[
                ("relapse_risk_6_12m", outcomes.relapse_risk_6_12m),
                ("readmission_risk", outcomes.readmission_risk),
                (
                    "early_intervention_window_days",
                    outcomes.early_intervention_window_days,
                ),
                (
                    "predicted_medication_adherence_3m",
                    outcomes.predicted_medication_adherence_3m,
                ),
                (
                    "estimated_false_alarm_rate",
                    outcomes.estimated_false_alarm_rate,
                ),
            ],
        )?;
        writeln!(f, "- risk_band: {}", self.0.risk_band.as_str())?;

        writeln!(f, "\n=== Comparison vs Routine Follow-up ===")?;
        write_rows(
            f,
            &[
                ("ai_relapse_risk_6_12m", comparison.ai_relapse_risk_6_12m),
                (
                    "routine_relapse_risk_6_12m",
                    comparison.routine_relapse_risk_6_12m,
                ),
                ("ai_readmission_risk", comparison.ai_readmission_risk),
                ("routine_readmission_risk", comparison.routine_readmission_risk),
                (
                    "ai_early_intervention_window_days",
                    comparison.ai_early_intervention_window_days,
                ),
                (
                    "routine_early_intervention_window_days",
                    comparison.routine_early_intervention_window_days,
                ),
                (
                    "ai_estimated_false_alarm_rate",
                    comparison.ai_estimated_false_alarm_rate,
                ),
            ],
        )
    }
}

fn write_rows(f: &mut fmt::Formatter<'_>, rows: &[(&str, f64)]) -> fmt::Result {
    for (label, value) in rows {
        writeln!(f, "- {label}: {value:.3}")?;
    }
    Ok(())
}

/// Render an assessment as the three-section console report
pub fn render_text(assessment: &RiskAssessment) -> String {
    TextReport(assessment).to_string()
}
