//! Core domain logic for the workout tracker.
//!
//! This crate contains the pure computation shared by the storage and CLI
//! layers:
//! - Estimation: predicted time of execution for exercises, scope blocks,
//!   and whole plans
//! - Aggregation: deriving actual set/rep/duration counts from logged sets
//! - Timer: the active-duration accumulator driven by start/stop events
//!
//! Everything here is synchronous and side-effect free; state (including
//! "now") is threaded in explicitly by callers.

mod aggregate;
mod estimate;
pub mod muscle;
pub mod records;
mod timer;

pub use aggregate::{
    ExerciseLogInput, PlannedTargets, SetAggregates, SetLog, aggregates_from_sets, planned_updates,
};
pub use estimate::{
    ExerciseTimeParams, PlanExerciseTime, exercise_estimated_time_seconds,
    plan_estimated_total_time_seconds, scope_estimated_time_seconds,
};
pub use muscle::{MuscleGroup, UnknownMuscleGroup};
pub use timer::{TimerEvent, TimerState, TimerUpdates, timer_updates};
