//! Session set aggregation.
//!
//! Derives summary counts (`actual_sets`, `actual_reps`,
//! `actual_duration_seconds`) for a session exercise from its logged sets,
//! honoring explicit overrides per field. `Option` models provided-vs-not on
//! every override: `Some(0)` is an explicit zero and is used verbatim, `None`
//! means the caller did not supply the field.

use serde::{Deserialize, Serialize};

/// One logged unit of work during a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetLog {
    /// 1-based position of the set within its exercise.
    pub set_number: i64,
    pub reps: Option<i64>,
    pub duration_seconds: Option<i64>,
    pub weight_kg: Option<f64>,
    /// Side indicator for unilateral exercises (alternating sides).
    pub side_number: Option<i64>,
}

/// Input for aggregation: explicit overrides plus the raw set logs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExerciseLogInput {
    pub actual_sets: Option<i64>,
    pub actual_reps: Option<i64>,
    pub actual_duration_seconds: Option<i64>,
    pub sets: Vec<SetLog>,
}

/// Summary counts for a session exercise. Each field is independently
/// `None` when neither an override nor a derivable value exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAggregates {
    pub actual_sets: Option<i64>,
    pub actual_reps: Option<i64>,
    pub actual_duration_seconds: Option<i64>,
}

/// Planned-target fields of a session-exercise update request. Only the
/// provided fields may be written downstream (partial update).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedTargets {
    pub planned_sets: Option<i64>,
    pub planned_reps: Option<i64>,
    pub planned_duration_seconds: Option<i64>,
    pub planned_rest_seconds: Option<i64>,
}

/// Derives summary counts from set logs, with per-field override precedence.
///
/// - `actual_sets`: override, else the number of logged sets, else `None`.
/// - `actual_reps`: override, else the sum of defined `reps` values, but
///   only for rep-based exercises (`planned_reps` non-null) with at least
///   one logged set, and only when the sum is positive.
/// - `actual_duration_seconds`: override, else the **maximum** defined
///   `duration_seconds` across sets, only for duration-based exercises.
///   A unilateral exercise logs per-side durations; the exercise's duration
///   is its longest side, not the total, so durations max while reps sum.
#[must_use]
pub fn aggregates_from_sets(
    input: &ExerciseLogInput,
    planned_reps: Option<i64>,
    planned_duration_seconds: Option<i64>,
) -> SetAggregates {
    let actual_sets = input.actual_sets.or_else(|| {
        if input.sets.is_empty() {
            None
        } else {
            Some(i64::try_from(input.sets.len()).unwrap_or(i64::MAX))
        }
    });

    let actual_reps = input.actual_reps.or_else(|| {
        if planned_reps.is_none() || input.sets.is_empty() {
            return None;
        }
        let total: i64 = input.sets.iter().filter_map(|set| set.reps).sum();
        (total > 0).then_some(total)
    });

    let actual_duration_seconds = input.actual_duration_seconds.or_else(|| {
        if planned_duration_seconds.is_none() || input.sets.is_empty() {
            return None;
        }
        input.sets.iter().filter_map(|set| set.duration_seconds).max()
    });

    SetAggregates {
        actual_sets,
        actual_reps,
        actual_duration_seconds,
    }
}

/// Returns the planned-target fields to persist, or `None` when the request
/// provided none of them. Fields absent from the result must not be touched
/// downstream.
#[must_use]
pub fn planned_updates(targets: &PlannedTargets) -> Option<PlannedTargets> {
    let provided = targets.planned_sets.is_some()
        || targets.planned_reps.is_some()
        || targets.planned_duration_seconds.is_some()
        || targets.planned_rest_seconds.is_some();
    provided.then_some(*targets)
}
