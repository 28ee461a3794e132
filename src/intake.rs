//! Snapshot intake
//!
//! Parsing and plausibility checks for snapshots arriving from the
//! acquisition layer. The scoring core never calls [`validate_snapshot`]:
//! out-of-domain values are clamped there, not rejected. The CLI's `assess`
//! command reads snapshots through [`parse_validated_snapshot`] (rejecting
//! under `--strict`), and the FFI `validate` entry point reports issues
//! from [`validate_snapshot`].

use crate::error::RelapseError;
use crate::types::PatientSnapshot;
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Kind of plausibility problem found in a snapshot field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    /// NaN or infinite
    NonFinite,
    /// Outside the documented closed range
    OutOfRange { min: f64, max: f64 },
    /// Durations, counts and rates must not be negative
    Negative,
}

/// One plausibility problem in one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub value: f64,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            IssueKind::NonFinite => write!(f, "{} is not finite ({})", self.field, self.value),
            IssueKind::OutOfRange { min, max } => write!(
                f,
                "{} = {} is outside [{}, {}]",
                self.field, self.value, min, max
            ),
            IssueKind::Negative => write!(f, "{} = {} is negative", self.field, self.value),
        }
    }
}

/// Expected domain of a snapshot field
#[derive(Clone, Copy)]
enum Domain {
    Range(f64, f64),
    NonNegative,
    /// Any finite value (signed shifts)
    Finite,
}

/// Parse a snapshot from JSON. All eighteen fields are required.
pub fn parse_snapshot(json: &str) -> Result<PatientSnapshot, RelapseError> {
    serde_json::from_str(json).map_err(|e| RelapseError::ParseError(e.to_string()))
}

/// Collect every plausibility issue in a snapshot (empty when clean)
pub fn validate_snapshot(snapshot: &PatientSnapshot) -> Vec<ValidationIssue> {
    const VALENCE: Domain = Domain::Range(-1.0, 1.0);
    const RATIO: Domain = Domain::Range(0.0, 1.0);
    const NON_NEGATIVE: Domain = Domain::NonNegative;

    let fields = [
        ("baseline_speech_rate_wpm", snapshot.baseline_speech_rate_wpm, NON_NEGATIVE),
        ("current_speech_rate_wpm", snapshot.current_speech_rate_wpm, NON_NEGATIVE),
        ("baseline_pause_seconds", snapshot.baseline_pause_seconds, NON_NEGATIVE),
        ("current_pause_seconds", snapshot.current_pause_seconds, NON_NEGATIVE),
        ("baseline_emotion_valence", snapshot.baseline_emotion_valence, VALENCE),
        ("current_emotion_valence", snapshot.current_emotion_valence, VALENCE),
        ("baseline_disorganization", snapshot.baseline_disorganization, RATIO),
        ("current_disorganization", snapshot.current_disorganization, RATIO),
        ("baseline_sleep_hours", snapshot.baseline_sleep_hours, Domain::Range(0.0, 24.0)),
        ("current_sleep_hours", snapshot.current_sleep_hours, Domain::Range(0.0, 24.0)),
        ("sleep_variability_hours", snapshot.sleep_variability_hours, NON_NEGATIVE),
        ("baseline_activity_steps", snapshot.baseline_activity_steps, NON_NEGATIVE),
        ("current_activity_steps", snapshot.current_activity_steps, NON_NEGATIVE),
        ("circadian_shift_hours", snapshot.circadian_shift_hours, Domain::Finite),
        ("medication_adherence_ratio", snapshot.medication_adherence_ratio, RATIO),
        ("missed_followup_ratio", snapshot.missed_followup_ratio, RATIO),
        ("baseline_daily_messages", snapshot.baseline_daily_messages, NON_NEGATIVE),
        ("current_daily_messages", snapshot.current_daily_messages, NON_NEGATIVE),
    ];

    fields
        .into_iter()
        .filter_map(|(field, value, domain)| {
            check_field(value, domain).map(|kind| ValidationIssue { field, value, kind })
        })
        .collect()
}

/// Parse a snapshot and check it for plausibility issues.
///
/// Every issue is logged at `warn`. With `strict` set, any issue rejects the
/// snapshot; otherwise it is returned for scoring as-is.
pub fn parse_validated_snapshot(
    json: &str,
    strict: bool,
) -> Result<PatientSnapshot, RelapseError> {
    let snapshot = parse_snapshot(json)?;
    let issues = validate_snapshot(&snapshot);
    for issue in &issues {
        warn!(field = issue.field, value = issue.value, "{issue}");
    }

    if strict && !issues.is_empty() {
        Err(RelapseError::ValidationFailed(issues.len()))
    } else {
        Ok(snapshot)
    }
}

fn check_field(value: f64, domain: Domain) -> Option<IssueKind> {
    if !value.is_finite() {
        return Some(IssueKind::NonFinite);
    }
    match domain {
        Domain::Range(min, max) if value < min || value > max => {
            Some(IssueKind::OutOfRange { min, max })
        }
        Domain::NonNegative if value < 0.0 => Some(IssueKind::Negative),
        _ => None,
    }
}
