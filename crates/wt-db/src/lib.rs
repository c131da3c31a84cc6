//! Storage layer for the workout tracker.
//!
//! Provides persistence for the exercise library, workout plans, sessions,
//! set logs, and personal records using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. A `Database` instance can be moved between threads but cannot
//! be shared across threads without external synchronization.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in ISO 8601 format (e.g.,
//! `2024-01-15T10:30:00Z`). This format is used by `chrono::DateTime<Utc>`
//! serialization and ensures:
//! - Lexicographic ordering matches chronological ordering
//! - Human-readable values in the database
//! - Timezone-aware (always UTC)
//!
//! ## Timer Columns
//!
//! `sessions.last_timer_started_at` / `last_timer_stopped_at` are the
//! checkpoints threaded through `wt_core::timer_updates`. Updates use
//! COALESCE so a checkpoint absent from a timer event leaves the persisted
//! value untouched.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use serde::Serialize;
use thiserror::Error;

use wt_core::{PlannedTargets, SetAggregates, TimerState, TimerUpdates};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for {record_id}: {timestamp}")]
    TimestampParse {
        record_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// An exercise in the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseRecord {
    pub id: String,
    pub name: String,
    pub muscle: String,
    pub description: Option<String>,
    pub unilateral: bool,
    pub created_at: String,
}

/// A workout plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Estimated seconds for the whole plan; NULL when nothing is estimable.
    pub estimated_total_time_seconds: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// One exercise row inside a plan, joined with the exercise name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanExerciseRecord {
    pub id: String,
    pub plan_id: String,
    pub exercise_id: String,
    pub exercise_name: String,
    pub order_index: i64,
    pub scope_id: Option<String>,
    pub scope_repeat_count: Option<i64>,
    pub planned_sets: Option<i64>,
    pub planned_reps: Option<i64>,
    pub planned_duration_seconds: Option<i64>,
    pub planned_rest_seconds: Option<i64>,
    pub planned_rest_after_series_seconds: Option<i64>,
    pub estimated_set_time_seconds: Option<i64>,
    pub estimated_time_seconds: Option<i64>,
}

impl PlanExerciseRecord {
    /// Declarative timing parameters for the estimation engine.
    #[must_use]
    pub fn time_params(&self) -> wt_core::ExerciseTimeParams {
        wt_core::ExerciseTimeParams {
            series: self.planned_sets,
            reps: self.planned_reps,
            duration_seconds: self.planned_duration_seconds,
            rest_between_sets_seconds: self.planned_rest_seconds,
            rest_after_series_seconds: self.planned_rest_after_series_seconds,
            estimated_set_time_seconds: self.estimated_set_time_seconds,
        }
    }

    /// Timing parameters plus scope membership, for plan-level estimation.
    #[must_use]
    pub fn plan_time(&self) -> wt_core::PlanExerciseTime {
        wt_core::PlanExerciseTime {
            params: self.time_params(),
            scope_id: self.scope_id.clone(),
            scope_repeat_count: self.scope_repeat_count,
        }
    }
}

/// A training session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub id: String,
    pub plan_id: Option<String>,
    pub plan_name: Option<String>,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub active_duration_seconds: i64,
    pub last_timer_started_at: Option<String>,
    pub last_timer_stopped_at: Option<String>,
}

impl SessionRecord {
    /// Timer state for `wt_core::timer_updates`.
    pub fn timer_state(&self) -> Result<TimerState, DbError> {
        let last_timer_started_at = self
            .last_timer_started_at
            .as_deref()
            .map(|raw| parse_timestamp(raw, &self.id))
            .transpose()?;
        Ok(TimerState {
            active_duration_seconds: self.active_duration_seconds,
            last_timer_started_at,
        })
    }

    /// Whether the session timer is currently running.
    ///
    /// Lexicographic comparison is chronological because all timestamps are
    /// written in one RFC 3339 format.
    #[must_use]
    pub fn is_running(&self) -> bool {
        match (&self.last_timer_started_at, &self.last_timer_stopped_at) {
            (Some(_), None) => true,
            (Some(started), Some(stopped)) => stopped < started,
            (None, _) => false,
        }
    }
}

/// One exercise within a session, joined with the exercise name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionExerciseRecord {
    pub id: String,
    pub session_id: String,
    pub exercise_id: String,
    pub exercise_name: String,
    pub order_index: i64,
    pub planned_sets: Option<i64>,
    pub planned_reps: Option<i64>,
    pub planned_duration_seconds: Option<i64>,
    pub planned_rest_seconds: Option<i64>,
    pub actual_sets: Option<i64>,
    pub actual_reps: Option<i64>,
    pub actual_duration_seconds: Option<i64>,
}

/// One logged set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetLogRecord {
    pub id: String,
    pub session_exercise_id: String,
    pub set_number: i64,
    pub reps: Option<i64>,
    pub duration_seconds: Option<i64>,
    pub weight_kg: Option<f64>,
    pub side_number: Option<i64>,
    pub logged_at: String,
}

impl SetLogRecord {
    /// The aggregation engine's view of this row.
    #[must_use]
    pub fn set_log(&self) -> wt_core::SetLog {
        wt_core::SetLog {
            set_number: self.set_number,
            reps: self.reps,
            duration_seconds: self.duration_seconds,
            weight_kg: self.weight_kg,
            side_number: self.side_number,
        }
    }
}

/// Best recorded lift for an exercise, joined with the exercise name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalRecordRow {
    pub exercise_id: String,
    pub exercise_name: String,
    pub weight_kg: f64,
    pub reps: i64,
    pub estimated_one_rep_max: f64,
    pub achieved_at: String,
}

/// Row counts shown by the status command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub exercises: i64,
    pub plans: i64,
    pub sessions: i64,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS exercises (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                muscle TEXT NOT NULL,
                description TEXT,
                unilateral INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_exercises_muscle ON exercises(muscle);

            CREATE TABLE IF NOT EXISTS plans (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                description TEXT,
                estimated_total_time_seconds INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Plan rows carry the declarative timing parameters the
            -- estimation engine consumes, plus scope (superset) membership.
            CREATE TABLE IF NOT EXISTS plan_exercises (
                id TEXT PRIMARY KEY,
                plan_id TEXT NOT NULL,
                exercise_id TEXT NOT NULL,
                order_index INTEGER NOT NULL,
                scope_id TEXT,
                scope_repeat_count INTEGER,
                planned_sets INTEGER,
                planned_reps INTEGER,
                planned_duration_seconds INTEGER,
                planned_rest_seconds INTEGER,
                planned_rest_after_series_seconds INTEGER,
                estimated_set_time_seconds INTEGER,
                estimated_time_seconds INTEGER,
                FOREIGN KEY (plan_id) REFERENCES plans(id) ON DELETE CASCADE,
                FOREIGN KEY (exercise_id) REFERENCES exercises(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_plan_exercises_plan ON plan_exercises(plan_id);

            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                plan_id TEXT,
                started_at TEXT NOT NULL,
                ended_at TEXT,
                active_duration_seconds INTEGER NOT NULL DEFAULT 0,
                last_timer_started_at TEXT,
                last_timer_stopped_at TEXT,
                FOREIGN KEY (plan_id) REFERENCES plans(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_started ON sessions(started_at);

            CREATE TABLE IF NOT EXISTS session_exercises (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                exercise_id TEXT NOT NULL,
                order_index INTEGER NOT NULL,
                planned_sets INTEGER,
                planned_reps INTEGER,
                planned_duration_seconds INTEGER,
                planned_rest_seconds INTEGER,
                actual_sets INTEGER,
                actual_reps INTEGER,
                actual_duration_seconds INTEGER,
                FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE,
                FOREIGN KEY (exercise_id) REFERENCES exercises(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_session_exercises_session ON session_exercises(session_id);

            CREATE TABLE IF NOT EXISTS set_logs (
                id TEXT PRIMARY KEY,
                session_exercise_id TEXT NOT NULL,
                set_number INTEGER NOT NULL,
                reps INTEGER,
                duration_seconds INTEGER,
                weight_kg REAL,
                side_number INTEGER,
                logged_at TEXT NOT NULL,
                FOREIGN KEY (session_exercise_id) REFERENCES session_exercises(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_set_logs_session_exercise ON set_logs(session_exercise_id);

            CREATE TABLE IF NOT EXISTS personal_records (
                exercise_id TEXT PRIMARY KEY,
                weight_kg REAL NOT NULL,
                reps INTEGER NOT NULL,
                estimated_one_rep_max REAL NOT NULL,
                achieved_at TEXT NOT NULL,
                FOREIGN KEY (exercise_id) REFERENCES exercises(id) ON DELETE CASCADE
            );
            ",
        )?;
        Ok(())
    }

    //
    // Exercises
    //

    /// Inserts an exercise. Fails on a duplicate name.
    pub fn insert_exercise(&mut self, exercise: &ExerciseRecord) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO exercises (id, name, muscle, description, unilateral, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
            params![
                exercise.id,
                exercise.name,
                exercise.muscle,
                exercise.description,
                exercise.unilateral,
                exercise.created_at,
            ],
        )?;
        Ok(())
    }

    /// Finds an exercise by exact name.
    pub fn find_exercise(&self, name: &str) -> Result<Option<ExerciseRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, name, muscle, description, unilateral, created_at
            FROM exercises
            WHERE name = ?
            ",
        )?;
        let mut rows = stmt.query_map([name], exercise_from_row)?;
        rows.next().transpose().map_err(DbError::from)
    }

    /// Lists exercises, optionally filtered by muscle group.
    pub fn list_exercises(&self, muscle: Option<&str>) -> Result<Vec<ExerciseRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, name, muscle, description, unilateral, created_at
            FROM exercises
            WHERE ?1 IS NULL OR muscle = ?1
            ORDER BY name ASC
            ",
        )?;
        let rows = stmt.query_map([muscle], exercise_from_row)?;
        let mut exercises = Vec::new();
        for row in rows {
            exercises.push(row?);
        }
        Ok(exercises)
    }

    /// Deletes an exercise by name. Returns whether a row was removed.
    pub fn delete_exercise(&mut self, name: &str) -> Result<bool, DbError> {
        let removed = self
            .conn
            .execute("DELETE FROM exercises WHERE name = ?", [name])?;
        Ok(removed > 0)
    }

    //
    // Plans
    //

    /// Inserts a plan. Fails on a duplicate name.
    pub fn insert_plan(&mut self, plan: &PlanRecord) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO plans (id, name, description, estimated_total_time_seconds, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
            params![
                plan.id,
                plan.name,
                plan.description,
                plan.estimated_total_time_seconds,
                plan.created_at,
                plan.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Finds a plan by exact name.
    pub fn find_plan(&self, name: &str) -> Result<Option<PlanRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, name, description, estimated_total_time_seconds, created_at, updated_at
            FROM plans
            WHERE name = ?
            ",
        )?;
        let mut rows = stmt.query_map([name], plan_from_row)?;
        rows.next().transpose().map_err(DbError::from)
    }

    /// Lists plans ordered by name.
    pub fn list_plans(&self) -> Result<Vec<PlanRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, name, description, estimated_total_time_seconds, created_at, updated_at
            FROM plans
            ORDER BY name ASC
            ",
        )?;
        let rows = stmt.query_map([], plan_from_row)?;
        let mut plans = Vec::new();
        for row in rows {
            plans.push(row?);
        }
        Ok(plans)
    }

    /// Deletes a plan by name. Returns whether a row was removed.
    pub fn delete_plan(&mut self, name: &str) -> Result<bool, DbError> {
        let removed = self
            .conn
            .execute("DELETE FROM plans WHERE name = ?", [name])?;
        Ok(removed > 0)
    }

    /// Appends an exercise row to a plan.
    pub fn insert_plan_exercise(&mut self, row: &PlanExerciseRecord) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO plan_exercises
            (id, plan_id, exercise_id, order_index, scope_id, scope_repeat_count,
             planned_sets, planned_reps, planned_duration_seconds, planned_rest_seconds,
             planned_rest_after_series_seconds, estimated_set_time_seconds, estimated_time_seconds)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                row.id,
                row.plan_id,
                row.exercise_id,
                row.order_index,
                row.scope_id,
                row.scope_repeat_count,
                row.planned_sets,
                row.planned_reps,
                row.planned_duration_seconds,
                row.planned_rest_seconds,
                row.planned_rest_after_series_seconds,
                row.estimated_set_time_seconds,
                row.estimated_time_seconds,
            ],
        )?;
        Ok(())
    }

    /// Next free position in a plan (0-based).
    pub fn next_plan_exercise_order(&self, plan_id: &str) -> Result<i64, DbError> {
        let next: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(order_index) + 1, 0) FROM plan_exercises WHERE plan_id = ?",
            [plan_id],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    /// Lists a plan's exercise rows in plan order.
    pub fn list_plan_exercises(&self, plan_id: &str) -> Result<Vec<PlanExerciseRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT pe.id, pe.plan_id, pe.exercise_id, e.name, pe.order_index,
                   pe.scope_id, pe.scope_repeat_count,
                   pe.planned_sets, pe.planned_reps, pe.planned_duration_seconds,
                   pe.planned_rest_seconds, pe.planned_rest_after_series_seconds,
                   pe.estimated_set_time_seconds, pe.estimated_time_seconds
            FROM plan_exercises pe
            JOIN exercises e ON e.id = pe.exercise_id
            WHERE pe.plan_id = ?
            ORDER BY pe.order_index ASC
            ",
        )?;
        let rows = stmt.query_map([plan_id], |row| {
            Ok(PlanExerciseRecord {
                id: row.get(0)?,
                plan_id: row.get(1)?,
                exercise_id: row.get(2)?,
                exercise_name: row.get(3)?,
                order_index: row.get(4)?,
                scope_id: row.get(5)?,
                scope_repeat_count: row.get(6)?,
                planned_sets: row.get(7)?,
                planned_reps: row.get(8)?,
                planned_duration_seconds: row.get(9)?,
                planned_rest_seconds: row.get(10)?,
                planned_rest_after_series_seconds: row.get(11)?,
                estimated_set_time_seconds: row.get(12)?,
                estimated_time_seconds: row.get(13)?,
            })
        })?;
        let mut exercises = Vec::new();
        for row in rows {
            exercises.push(row?);
        }
        Ok(exercises)
    }

    /// Persists the per-row estimate computed by the estimation engine.
    pub fn set_plan_exercise_estimate(
        &mut self,
        plan_exercise_id: &str,
        estimated_time_seconds: Option<i64>,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE plan_exercises SET estimated_time_seconds = ? WHERE id = ?",
            params![estimated_time_seconds, plan_exercise_id],
        )?;
        Ok(())
    }

    /// Persists the plan's estimated total.
    pub fn set_plan_estimated_total(
        &mut self,
        plan_id: &str,
        estimated_total_time_seconds: Option<i64>,
        updated_at: &str,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE plans SET estimated_total_time_seconds = ?, updated_at = ? WHERE id = ?",
            params![estimated_total_time_seconds, updated_at, plan_id],
        )?;
        Ok(())
    }

    //
    // Sessions
    //

    /// Creates a session and its exercise rows in one transaction.
    pub fn create_session(
        &mut self,
        session: &SessionRecord,
        exercises: &[SessionExerciseRecord],
    ) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "
            INSERT INTO sessions
            (id, plan_id, started_at, ended_at, active_duration_seconds,
             last_timer_started_at, last_timer_stopped_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                session.id,
                session.plan_id,
                session.started_at,
                session.ended_at,
                session.active_duration_seconds,
                session.last_timer_started_at,
                session.last_timer_stopped_at,
            ],
        )?;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO session_exercises
                (id, session_id, exercise_id, order_index, planned_sets, planned_reps,
                 planned_duration_seconds, planned_rest_seconds,
                 actual_sets, actual_reps, actual_duration_seconds)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for exercise in exercises {
                stmt.execute(params![
                    exercise.id,
                    exercise.session_id,
                    exercise.exercise_id,
                    exercise.order_index,
                    exercise.planned_sets,
                    exercise.planned_reps,
                    exercise.planned_duration_seconds,
                    exercise.planned_rest_seconds,
                    exercise.actual_sets,
                    exercise.actual_reps,
                    exercise.actual_duration_seconds,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(
            session_id = %session.id,
            exercises = exercises.len(),
            "created session"
        );
        Ok(())
    }

    /// The session without an end time, if any.
    pub fn active_session(&self) -> Result<Option<SessionRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT s.id, s.plan_id, p.name, s.started_at, s.ended_at,
                   s.active_duration_seconds, s.last_timer_started_at, s.last_timer_stopped_at
            FROM sessions s
            LEFT JOIN plans p ON p.id = s.plan_id
            WHERE s.ended_at IS NULL
            ORDER BY s.started_at DESC
            LIMIT 1
            ",
        )?;
        let mut rows = stmt.query_map([], session_from_row)?;
        rows.next().transpose().map_err(DbError::from)
    }

    /// Lists a session's exercises in session order.
    pub fn list_session_exercises(
        &self,
        session_id: &str,
    ) -> Result<Vec<SessionExerciseRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT se.id, se.session_id, se.exercise_id, e.name, se.order_index,
                   se.planned_sets, se.planned_reps, se.planned_duration_seconds,
                   se.planned_rest_seconds, se.actual_sets, se.actual_reps,
                   se.actual_duration_seconds
            FROM session_exercises se
            JOIN exercises e ON e.id = se.exercise_id
            WHERE se.session_id = ?
            ORDER BY se.order_index ASC
            ",
        )?;
        let rows = stmt.query_map([session_id], |row| {
            Ok(SessionExerciseRecord {
                id: row.get(0)?,
                session_id: row.get(1)?,
                exercise_id: row.get(2)?,
                exercise_name: row.get(3)?,
                order_index: row.get(4)?,
                planned_sets: row.get(5)?,
                planned_reps: row.get(6)?,
                planned_duration_seconds: row.get(7)?,
                planned_rest_seconds: row.get(8)?,
                actual_sets: row.get(9)?,
                actual_reps: row.get(10)?,
                actual_duration_seconds: row.get(11)?,
            })
        })?;
        let mut exercises = Vec::new();
        for row in rows {
            exercises.push(row?);
        }
        Ok(exercises)
    }

    /// Appends a set log.
    pub fn insert_set_log(&mut self, log: &SetLogRecord) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO set_logs
            (id, session_exercise_id, set_number, reps, duration_seconds, weight_kg,
             side_number, logged_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                log.id,
                log.session_exercise_id,
                log.set_number,
                log.reps,
                log.duration_seconds,
                log.weight_kg,
                log.side_number,
                log.logged_at,
            ],
        )?;
        Ok(())
    }

    /// Lists set logs for one session exercise in logging order.
    pub fn list_set_logs(&self, session_exercise_id: &str) -> Result<Vec<SetLogRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, session_exercise_id, set_number, reps, duration_seconds, weight_kg,
                   side_number, logged_at
            FROM set_logs
            WHERE session_exercise_id = ?
            ORDER BY logged_at ASC, set_number ASC
            ",
        )?;
        let rows = stmt.query_map([session_exercise_id], |row| {
            Ok(SetLogRecord {
                id: row.get(0)?,
                session_exercise_id: row.get(1)?,
                set_number: row.get(2)?,
                reps: row.get(3)?,
                duration_seconds: row.get(4)?,
                weight_kg: row.get(5)?,
                side_number: row.get(6)?,
                logged_at: row.get(7)?,
            })
        })?;
        let mut logs = Vec::new();
        for row in rows {
            logs.push(row?);
        }
        Ok(logs)
    }

    /// Number of sets already logged for one session exercise.
    pub fn count_set_logs(&self, session_exercise_id: &str) -> Result<i64, DbError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM set_logs WHERE session_exercise_id = ?",
            [session_exercise_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Persists the result of `wt_core::timer_updates`.
    ///
    /// Checkpoints absent from the update keep their persisted value
    /// (COALESCE), matching the engine's "omitted means untouched" contract.
    pub fn update_session_timer(
        &mut self,
        session_id: &str,
        updates: &TimerUpdates,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "
            UPDATE sessions
            SET active_duration_seconds = ?,
                last_timer_started_at = COALESCE(?, last_timer_started_at),
                last_timer_stopped_at = COALESCE(?, last_timer_stopped_at)
            WHERE id = ?
            ",
            params![
                updates.active_duration_seconds,
                updates.last_timer_started_at.map(format_timestamp),
                updates.last_timer_stopped_at.map(format_timestamp),
                session_id,
            ],
        )?;
        tracing::debug!(
            session_id,
            total = updates.active_duration_seconds,
            "persisted timer update"
        );
        Ok(())
    }

    /// Marks a session as finished.
    pub fn finish_session(&mut self, session_id: &str, ended_at: &str) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE sessions SET ended_at = ? WHERE id = ?",
            params![ended_at, session_id],
        )?;
        Ok(())
    }

    /// Deletes a session. Returns whether a row was removed.
    pub fn delete_session(&mut self, session_id: &str) -> Result<bool, DbError> {
        let removed = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?", [session_id])?;
        Ok(removed > 0)
    }

    /// Persists the aggregation engine's summary counts verbatim.
    pub fn update_session_exercise_actuals(
        &mut self,
        session_exercise_id: &str,
        aggregates: &SetAggregates,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "
            UPDATE session_exercises
            SET actual_sets = ?, actual_reps = ?, actual_duration_seconds = ?
            WHERE id = ?
            ",
            params![
                aggregates.actual_sets,
                aggregates.actual_reps,
                aggregates.actual_duration_seconds,
                session_exercise_id,
            ],
        )?;
        Ok(())
    }

    /// Applies a partial planned-target update: only provided fields are
    /// written, everything else keeps its persisted value.
    pub fn apply_planned_updates(
        &mut self,
        session_exercise_id: &str,
        updates: &PlannedTargets,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "
            UPDATE session_exercises
            SET planned_sets = COALESCE(?, planned_sets),
                planned_reps = COALESCE(?, planned_reps),
                planned_duration_seconds = COALESCE(?, planned_duration_seconds),
                planned_rest_seconds = COALESCE(?, planned_rest_seconds)
            WHERE id = ?
            ",
            params![
                updates.planned_sets,
                updates.planned_reps,
                updates.planned_duration_seconds,
                updates.planned_rest_seconds,
                session_exercise_id,
            ],
        )?;
        Ok(())
    }

    //
    // Personal records
    //

    /// The stored record for an exercise, if any.
    pub fn personal_record(&self, exercise_id: &str) -> Result<Option<PersonalRecordRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT pr.exercise_id, e.name, pr.weight_kg, pr.reps, pr.estimated_one_rep_max,
                   pr.achieved_at
            FROM personal_records pr
            JOIN exercises e ON e.id = pr.exercise_id
            WHERE pr.exercise_id = ?
            ",
        )?;
        let mut rows = stmt.query_map([exercise_id], personal_record_from_row)?;
        rows.next().transpose().map_err(DbError::from)
    }

    /// Inserts or replaces the record for an exercise.
    pub fn upsert_personal_record(&mut self, record: &PersonalRecordRow) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO personal_records (exercise_id, weight_kg, reps, estimated_one_rep_max, achieved_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(exercise_id) DO UPDATE SET
                weight_kg = excluded.weight_kg,
                reps = excluded.reps,
                estimated_one_rep_max = excluded.estimated_one_rep_max,
                achieved_at = excluded.achieved_at
            ",
            params![
                record.exercise_id,
                record.weight_kg,
                record.reps,
                record.estimated_one_rep_max,
                record.achieved_at,
            ],
        )?;
        Ok(())
    }

    /// Most recent personal records, newest first.
    pub fn list_personal_records(&self, limit: i64) -> Result<Vec<PersonalRecordRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT pr.exercise_id, e.name, pr.weight_kg, pr.reps, pr.estimated_one_rep_max,
                   pr.achieved_at
            FROM personal_records pr
            JOIN exercises e ON e.id = pr.exercise_id
            ORDER BY pr.achieved_at DESC, e.name ASC
            LIMIT ?
            ",
        )?;
        let rows = stmt.query_map([limit], personal_record_from_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Row counts for the status command.
    pub fn status_counts(&self) -> Result<StatusCounts, DbError> {
        let count = |table: &str| -> Result<i64, rusqlite::Error> {
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })
        };
        Ok(StatusCounts {
            exercises: count("exercises")?,
            plans: count("plans")?,
            sessions: count("sessions")?,
        })
    }
}

fn exercise_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExerciseRecord> {
    Ok(ExerciseRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        muscle: row.get(2)?,
        description: row.get(3)?,
        unilateral: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn plan_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlanRecord> {
    Ok(PlanRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        estimated_total_time_seconds: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        id: row.get(0)?,
        plan_id: row.get(1)?,
        plan_name: row.get(2)?,
        started_at: row.get(3)?,
        ended_at: row.get(4)?,
        active_duration_seconds: row.get(5)?,
        last_timer_started_at: row.get(6)?,
        last_timer_stopped_at: row.get(7)?,
    })
}

fn personal_record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PersonalRecordRow> {
    Ok(PersonalRecordRow {
        exercise_id: row.get(0)?,
        exercise_name: row.get(1)?,
        weight_kg: row.get(2)?,
        reps: row.get(3)?,
        estimated_one_rep_max: row.get(4)?,
        achieved_at: row.get(5)?,
    })
}

/// Formats a timestamp in the single RFC 3339 form used across the schema.
#[must_use]
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored timestamp, reporting the owning record on failure.
pub fn parse_timestamp(timestamp: &str, record_id: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            record_id: record_id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}
