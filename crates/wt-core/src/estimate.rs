//! Estimated time of execution for plan exercises.
//!
//! Computes a predicted duration for a single exercise, a repeated scope
//! block (superset), and a whole plan, from declarative per-exercise
//! parameters.
//!
//! # Algorithm Summary
//!
//! 1. An explicit per-exercise estimate always wins when positive
//! 2. Otherwise work time is `duration * series` (duration-based) or
//!    `reps * 5 * series` (rep-based), plus rest between and after sets
//! 3. Scope blocks repeat their members' combined estimate `repeat_count`
//!    times; plans sum singles and scope blocks
//!
//! `None` is the "nothing estimable" sentinel throughout, never 0, so
//! callers can distinguish "unknown" from "instant".

use serde::{Deserialize, Serialize};

/// Seconds of work attributed to one repetition when an exercise declares
/// reps but no duration.
const SECONDS_PER_REP: i64 = 5;

/// Declarative timing parameters for one plan exercise.
///
/// All fields are optional; absent or out-of-range values degrade to the
/// defaults documented on [`exercise_estimated_time_seconds`] instead of
/// failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseTimeParams {
    /// Number of sets. The exercise is not schedulable without a value >= 1.
    pub series: Option<i64>,
    /// Repetitions per set. Ignored when `duration_seconds` is present.
    pub reps: Option<i64>,
    /// Seconds of work per set.
    pub duration_seconds: Option<i64>,
    /// Rest inserted between consecutive sets (applied `series - 1` times).
    pub rest_between_sets_seconds: Option<i64>,
    /// One-time rest appended after the last set.
    pub rest_after_series_seconds: Option<i64>,
    /// Precomputed override. When positive it short-circuits all derived
    /// computation, including the `series` validity check.
    pub estimated_set_time_seconds: Option<i64>,
}

/// A plan exercise with optional scope (superset) membership.
///
/// All exercises sharing a `scope_id` form one block that repeats
/// `scope_repeat_count` times. Members of a scope are expected to carry the
/// same repeat count; the engine uses the first member's value and does not
/// verify the invariant at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanExerciseTime {
    pub params: ExerciseTimeParams,
    pub scope_id: Option<String>,
    pub scope_repeat_count: Option<i64>,
}

/// Estimated seconds to execute one exercise, or `None` when nothing can be
/// estimated.
///
/// Precedence, first match wins:
///
/// 1. A positive `estimated_set_time_seconds` is returned unchanged.
/// 2. `series` must be >= 1, otherwise `None`.
/// 3. Duration-based: `duration * series + (series - 1) * rest + rest_after`.
/// 4. Rep-based: `reps * 5 * series + (series - 1) * rest + rest_after`.
/// 5. Neither reps nor duration: `None`.
///
/// Rest values default to 0 when absent or negative; they never block
/// estimation. Duration takes precedence over reps when both are present.
#[must_use]
pub fn exercise_estimated_time_seconds(params: &ExerciseTimeParams) -> Option<i64> {
    if let Some(estimate) = params.estimated_set_time_seconds {
        if estimate > 0 {
            return Some(estimate);
        }
    }

    let series = params.series.filter(|&s| s >= 1)?;
    let rest = params
        .rest_between_sets_seconds
        .filter(|&r| r > 0)
        .unwrap_or(0);
    let rest_after = params
        .rest_after_series_seconds
        .filter(|&r| r > 0)
        .unwrap_or(0);

    if let Some(duration) = params.duration_seconds.filter(|&d| d > 0) {
        return Some(duration * series + (series - 1) * rest + rest_after);
    }

    if let Some(reps) = params.reps.filter(|&r| r > 0) {
        return Some(reps * SECONDS_PER_REP * series + (series - 1) * rest + rest_after);
    }

    None
}

/// Estimated seconds for one scope block: the members' combined estimate,
/// repeated `repeat_count` times.
///
/// Rest-after-series for each member is already included once per pass.
/// Returns `None` for an empty block or when no member is estimable.
#[must_use]
pub fn scope_estimated_time_seconds(
    exercises: &[ExerciseTimeParams],
    repeat_count: i64,
) -> Option<i64> {
    if exercises.is_empty() {
        return None;
    }

    let single_pass: i64 = exercises
        .iter()
        .map(|params| exercise_estimated_time_seconds(params).unwrap_or(0))
        .sum();

    if single_pass <= 0 {
        return None;
    }

    Some(single_pass * repeat_count.max(1))
}

/// Estimated seconds for a whole plan: singles plus scope blocks.
///
/// Exercises without a `scope_id` contribute their own estimate; exercises
/// sharing a `scope_id` are grouped and contribute one
/// [`scope_estimated_time_seconds`] per group, with the repeat count taken
/// from the group's first member. Group order does not affect the sum.
#[must_use]
pub fn plan_estimated_total_time_seconds(exercises: &[PlanExerciseTime]) -> Option<i64> {
    let mut total = 0i64;
    let mut scopes: Vec<(&str, Vec<&PlanExerciseTime>)> = Vec::new();

    for exercise in exercises {
        match exercise.scope_id.as_deref() {
            None => {
                total += exercise_estimated_time_seconds(&exercise.params).unwrap_or(0);
            }
            Some(scope_id) => match scopes.iter_mut().find(|(id, _)| *id == scope_id) {
                Some((_, members)) => members.push(exercise),
                None => scopes.push((scope_id, vec![exercise])),
            },
        }
    }

    for (_, members) in &scopes {
        let repeat_count = members
            .first()
            .and_then(|member| member.scope_repeat_count)
            .filter(|&count| count >= 1)
            .unwrap_or(1);
        let params: Vec<ExerciseTimeParams> =
            members.iter().map(|member| member.params.clone()).collect();
        total += scope_estimated_time_seconds(&params, repeat_count).unwrap_or(0);
    }

    (total > 0).then_some(total)
}
