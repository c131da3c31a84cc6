//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use wt_core::MuscleGroup;

/// Personal workout tracker.
///
/// Manages an exercise library, workout plans with estimated execution
/// times, and training sessions with logged sets, a pause/resume timer,
/// and personal records.
#[derive(Debug, Parser)]
#[command(name = "wt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage the exercise library.
    Exercise {
        #[command(subcommand)]
        action: ExerciseAction,
    },

    /// Manage workout plans.
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },

    /// Run training sessions.
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Show current tracking status.
    Status {
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

/// Exercise library subcommands.
#[derive(Debug, Subcommand)]
pub enum ExerciseAction {
    /// Add an exercise to the library.
    Add {
        /// Exercise name.
        name: String,

        /// Primary muscle group.
        #[arg(long)]
        muscle: MuscleGroup,

        /// Free-form description.
        #[arg(long)]
        desc: Option<String>,

        /// The exercise is performed one side at a time.
        #[arg(long)]
        unilateral: bool,
    },

    /// List exercises.
    List {
        /// Only show exercises for this muscle group.
        #[arg(long)]
        muscle: Option<MuscleGroup>,

        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Delete an exercise.
    Delete {
        /// Exercise name.
        name: String,
    },
}

/// Workout plan subcommands.
#[derive(Debug, Subcommand)]
pub enum PlanAction {
    /// Create an empty plan.
    Create {
        /// Plan name.
        name: String,

        /// Free-form description.
        #[arg(long)]
        desc: Option<String>,
    },

    /// Append an exercise to a plan.
    AddExercise(PlanExerciseArgs),

    /// List plans with their estimated total times.
    List {
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Show one plan in detail.
    Show {
        /// Plan name.
        plan: String,
    },

    /// Delete a plan.
    Delete {
        /// Plan name.
        plan: String,
    },
}

/// Arguments for `plan add-exercise`.
#[derive(Debug, Args)]
pub struct PlanExerciseArgs {
    /// Plan name.
    pub plan: String,

    /// Exercise name.
    pub exercise: String,

    /// Number of sets.
    #[arg(long)]
    pub sets: Option<i64>,

    /// Repetitions per set.
    #[arg(long)]
    pub reps: Option<i64>,

    /// Seconds of work per set (takes precedence over reps for estimation).
    #[arg(long)]
    pub duration: Option<i64>,

    /// Rest between sets, in seconds.
    #[arg(long)]
    pub rest: Option<i64>,

    /// Rest after the last set, in seconds.
    #[arg(long)]
    pub rest_after: Option<i64>,

    /// Explicit estimated time override, in seconds.
    #[arg(long)]
    pub set_time: Option<i64>,

    /// Scope (superset) block this exercise belongs to.
    #[arg(long)]
    pub scope: Option<String>,

    /// How many times the scope block repeats.
    #[arg(long, requires = "scope")]
    pub scope_repeat: Option<i64>,
}

/// Training session subcommands.
#[derive(Debug, Subcommand)]
pub enum SessionAction {
    /// Start a session from a plan.
    Start {
        /// Plan name.
        plan: String,
    },

    /// Log a set for an exercise in the active session.
    Log(LogSetArgs),

    /// Override actuals or update planned targets for a session exercise.
    Edit(EditExerciseArgs),

    /// Pause the session timer.
    Pause,

    /// Resume the session timer.
    Resume,

    /// Finish the active session, aggregating logged sets.
    Finish,

    /// Show the active session.
    Show,

    /// Discard the active session.
    Cancel,
}

/// Arguments for `session log`.
#[derive(Debug, Args)]
pub struct LogSetArgs {
    /// 1-based exercise position within the session.
    pub exercise: usize,

    /// Repetitions performed.
    #[arg(long)]
    pub reps: Option<i64>,

    /// Seconds of work performed.
    #[arg(long)]
    pub duration: Option<i64>,

    /// Weight moved, in kilograms.
    #[arg(long)]
    pub weight: Option<f64>,

    /// Side indicator for unilateral exercises.
    #[arg(long)]
    pub side: Option<i64>,
}

/// Arguments for `session edit`.
#[derive(Debug, Args)]
pub struct EditExerciseArgs {
    /// 1-based exercise position within the session.
    pub exercise: usize,

    /// Override the derived set count.
    #[arg(long)]
    pub actual_sets: Option<i64>,

    /// Override the derived rep total.
    #[arg(long)]
    pub actual_reps: Option<i64>,

    /// Override the derived duration, in seconds.
    #[arg(long)]
    pub actual_duration: Option<i64>,

    /// Update the planned set count.
    #[arg(long)]
    pub planned_sets: Option<i64>,

    /// Update the planned repetitions.
    #[arg(long)]
    pub planned_reps: Option<i64>,

    /// Update the planned duration, in seconds.
    #[arg(long)]
    pub planned_duration: Option<i64>,

    /// Update the planned rest, in seconds.
    #[arg(long)]
    pub planned_rest: Option<i64>,
}
