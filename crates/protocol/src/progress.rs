use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of a tracked operation.
///
/// `total_units == None` means the operation is indeterminate, in which case
/// `fraction_completed` is also `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub completed_units: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_units: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraction_completed: Option<f64>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressSnapshot {
    /// Builds a snapshot, deriving `fraction_completed` from the counts.
    pub fn new(
        completed_units: i64,
        total_units: Option<i64>,
        description: impl Into<String>,
        additional_info: Option<String>,
    ) -> Self {
        Self {
            completed_units,
            total_units,
            fraction_completed: total_units.map(|total| fraction(completed_units, total)),
            description: description.into(),
            additional_info,
            timestamp: Utc::now(),
        }
    }

    /// Returns `true` once a determinate operation has reached its total.
    pub fn is_finished(&self) -> bool {
        self.total_units
            .is_some_and(|total| self.completed_units >= total)
    }

    /// Progress as a percentage (0-100), or `None` when indeterminate.
    pub fn percentage(&self) -> Option<f64> {
        self.fraction_completed.map(|f| f * 100.0)
    }
}

/// Fraction of `total` covered by `completed`, clamped to `0.0..=1.0`.
///
/// An empty total counts as already complete.
fn fraction(completed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 1.0;
    }
    (completed as f64 / total as f64).clamp(0.0, 1.0)
}
