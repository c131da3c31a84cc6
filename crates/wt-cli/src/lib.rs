//! Workout tracker CLI library.
//!
//! This crate provides the CLI interface for the workout tracker: the plan
//! service (estimated-time recomputation) and session service (aggregation
//! and timer threading) live in [`commands`].

mod cli;
pub mod commands;
mod config;

pub use cli::{
    Cli, Commands, EditExerciseArgs, ExerciseAction, LogSetArgs, PlanAction, PlanExerciseArgs,
    SessionAction,
};
pub use config::Config;
