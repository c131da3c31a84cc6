//! Training session commands: the session service.
//!
//! Threads the persisted timer state through `wt_core::timer_updates` on
//! every pause/resume/finish, and runs set aggregation when a session is
//! finalized. All clock reads happen here; the engines only see explicit
//! timestamps.

use std::io::Write;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use wt_core::{
    ExerciseLogInput, PlannedTargets, TimerEvent, aggregates_from_sets, planned_updates, records,
    timer_updates,
};
use wt_db::{
    Database, PersonalRecordRow, SessionExerciseRecord, SessionRecord, SetLogRecord,
    format_timestamp,
};

use super::util::format_seconds;
use crate::{EditExerciseArgs, LogSetArgs};

pub fn start<W: Write>(
    db: &mut Database,
    writer: &mut W,
    plan_name: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    if let Some(active) = db.active_session()? {
        bail!("a session is already active (id {})", active.id);
    }
    let Some(plan) = db.find_plan(plan_name)? else {
        bail!("no plan named `{plan_name}`");
    };

    let rows = db.list_plan_exercises(&plan.id)?;
    if rows.is_empty() {
        bail!("plan `{plan_name}` has no exercises");
    }

    let session_id = Uuid::new_v4().to_string();
    let session = SessionRecord {
        id: session_id.clone(),
        plan_id: Some(plan.id.clone()),
        plan_name: Some(plan.name.clone()),
        started_at: format_timestamp(now),
        ended_at: None,
        active_duration_seconds: 0,
        // The timer starts running immediately.
        last_timer_started_at: Some(format_timestamp(now)),
        last_timer_stopped_at: None,
    };
    let exercises: Vec<SessionExerciseRecord> = rows
        .iter()
        .map(|row| SessionExerciseRecord {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.clone(),
            exercise_id: row.exercise_id.clone(),
            exercise_name: row.exercise_name.clone(),
            order_index: row.order_index,
            planned_sets: row.planned_sets,
            planned_reps: row.planned_reps,
            planned_duration_seconds: row.planned_duration_seconds,
            planned_rest_seconds: row.planned_rest_seconds,
            actual_sets: None,
            actual_reps: None,
            actual_duration_seconds: None,
        })
        .collect();
    db.create_session(&session, &exercises)?;

    writeln!(writer, "Started session for {}", plan.name)?;
    for (index, row) in rows.iter().enumerate() {
        let target = match (row.planned_reps, row.planned_duration_seconds) {
            (_, Some(duration)) => format!("{duration}s"),
            (Some(reps), None) => format!("{reps} reps"),
            (None, None) => "-".to_string(),
        };
        writeln!(
            writer,
            "{}. {} — {} sets x {}",
            index + 1,
            row.exercise_name,
            row.planned_sets.unwrap_or(0),
            target
        )?;
    }
    Ok(())
}

pub fn log_set<W: Write>(
    db: &mut Database,
    writer: &mut W,
    args: &LogSetArgs,
    now: DateTime<Utc>,
) -> Result<()> {
    let (_, exercise) = active_exercise(db, args.exercise)?;

    let set_number = db.count_set_logs(&exercise.id)? + 1;
    db.insert_set_log(&SetLogRecord {
        id: Uuid::new_v4().to_string(),
        session_exercise_id: exercise.id.clone(),
        set_number,
        reps: args.reps,
        duration_seconds: args.duration,
        weight_kg: args.weight,
        side_number: args.side,
        logged_at: format_timestamp(now),
    })?;
    writeln!(
        writer,
        "Logged set {set_number} for {}",
        exercise.exercise_name
    )?;

    check_personal_record(db, writer, &exercise, args, now)?;
    Ok(())
}

/// Updates the stored record when a logged weight+reps pair produces a new
/// best estimated one-rep max.
fn check_personal_record<W: Write>(
    db: &mut Database,
    writer: &mut W,
    exercise: &SessionExerciseRecord,
    args: &LogSetArgs,
    now: DateTime<Utc>,
) -> Result<()> {
    let (Some(weight_kg), Some(reps)) = (args.weight, args.reps) else {
        return Ok(());
    };
    let Some(estimate) = records::estimated_one_rep_max(weight_kg, reps) else {
        return Ok(());
    };

    let current = db
        .personal_record(&exercise.exercise_id)?
        .map(|record| record.estimated_one_rep_max);
    if records::improves_record(estimate, current) {
        db.upsert_personal_record(&PersonalRecordRow {
            exercise_id: exercise.exercise_id.clone(),
            exercise_name: exercise.exercise_name.clone(),
            weight_kg,
            reps,
            estimated_one_rep_max: estimate,
            achieved_at: format_timestamp(now),
        })?;
        writeln!(
            writer,
            "New personal record for {}: {weight_kg}kg x {reps} ({estimate:.1} est. 1RM)",
            exercise.exercise_name
        )?;
    }
    Ok(())
}

pub fn edit<W: Write>(db: &mut Database, writer: &mut W, args: &EditExerciseArgs) -> Result<()> {
    let (_, exercise) = active_exercise(db, args.exercise)?;

    // Planned targets first: the aggregation below discriminates rep-based
    // vs duration-based on the effective (post-update) targets.
    let targets = PlannedTargets {
        planned_sets: args.planned_sets,
        planned_reps: args.planned_reps,
        planned_duration_seconds: args.planned_duration,
        planned_rest_seconds: args.planned_rest,
    };
    if let Some(updates) = planned_updates(&targets) {
        db.apply_planned_updates(&exercise.id, &updates)?;
    }
    let planned_reps = args.planned_reps.or(exercise.planned_reps);
    let planned_duration = args.planned_duration.or(exercise.planned_duration_seconds);

    let input = ExerciseLogInput {
        actual_sets: args.actual_sets,
        actual_reps: args.actual_reps,
        actual_duration_seconds: args.actual_duration,
        sets: db
            .list_set_logs(&exercise.id)?
            .iter()
            .map(SetLogRecord::set_log)
            .collect(),
    };
    let aggregates = aggregates_from_sets(&input, planned_reps, planned_duration);
    db.update_session_exercise_actuals(&exercise.id, &aggregates)?;

    writeln!(writer, "Updated {}", exercise.exercise_name)?;
    Ok(())
}

pub fn pause<W: Write>(db: &mut Database, writer: &mut W, now: DateTime<Utc>) -> Result<()> {
    let session = require_active(db)?;
    if !session.is_running() {
        bail!("the session timer is not running");
    }

    let updates = timer_updates(
        &session.timer_state()?,
        &TimerEvent {
            last_timer_stopped_at: Some(now),
            ..Default::default()
        },
    );
    db.update_session_timer(&session.id, &updates)?;

    writeln!(
        writer,
        "Paused ({} active)",
        format_seconds(updates.active_duration_seconds)
    )?;
    Ok(())
}

pub fn resume<W: Write>(db: &mut Database, writer: &mut W, now: DateTime<Utc>) -> Result<()> {
    let session = require_active(db)?;
    if session.is_running() {
        bail!("the session timer is already running");
    }

    let updates = timer_updates(
        &session.timer_state()?,
        &TimerEvent {
            last_timer_started_at: Some(now),
            ..Default::default()
        },
    );
    db.update_session_timer(&session.id, &updates)?;

    writeln!(writer, "Resumed")?;
    Ok(())
}

pub fn finish<W: Write>(db: &mut Database, writer: &mut W, now: DateTime<Utc>) -> Result<()> {
    let session = require_active(db)?;

    // Close out a running interval; a paused timer needs no arithmetic.
    let total = if session.is_running() {
        let updates = timer_updates(
            &session.timer_state()?,
            &TimerEvent {
                last_timer_stopped_at: Some(now),
                ..Default::default()
            },
        );
        db.update_session_timer(&session.id, &updates)?;
        updates.active_duration_seconds
    } else {
        session.active_duration_seconds
    };

    for exercise in db.list_session_exercises(&session.id)? {
        let input = ExerciseLogInput {
            actual_sets: exercise.actual_sets,
            actual_reps: exercise.actual_reps,
            actual_duration_seconds: exercise.actual_duration_seconds,
            sets: db
                .list_set_logs(&exercise.id)?
                .iter()
                .map(SetLogRecord::set_log)
                .collect(),
        };
        let aggregates = aggregates_from_sets(
            &input,
            exercise.planned_reps,
            exercise.planned_duration_seconds,
        );
        db.update_session_exercise_actuals(&exercise.id, &aggregates)?;

        writeln!(
            writer,
            "{}: {} sets, {} reps, {}",
            exercise.exercise_name,
            aggregates.actual_sets.unwrap_or(0),
            aggregates.actual_reps.unwrap_or(0),
            aggregates
                .actual_duration_seconds
                .map_or_else(|| "-".to_string(), |seconds| format!("{seconds}s")),
        )?;
    }

    db.finish_session(&session.id, &format_timestamp(now))?;
    writeln!(writer, "Finished session ({} active)", format_seconds(total))?;
    Ok(())
}

pub fn show<W: Write>(db: &Database, writer: &mut W) -> Result<()> {
    let session = require_active(db)?;

    let plan_name = session.plan_name.as_deref().unwrap_or("(no plan)");
    let state = if session.is_running() {
        "running"
    } else {
        "paused"
    };
    writeln!(
        writer,
        "Session: {plan_name} (started {}, {} active, {state})",
        session.started_at,
        format_seconds(session.active_duration_seconds)
    )?;

    for (index, exercise) in db.list_session_exercises(&session.id)?.iter().enumerate() {
        let logged = db.count_set_logs(&exercise.id)?;
        writeln!(
            writer,
            "{}. {} — {}/{} sets logged",
            index + 1,
            exercise.exercise_name,
            logged,
            exercise.planned_sets.unwrap_or(0)
        )?;
    }
    Ok(())
}

pub fn cancel<W: Write>(db: &mut Database, writer: &mut W) -> Result<()> {
    let session = require_active(db)?;
    db.delete_session(&session.id)?;
    writeln!(writer, "Cancelled session {}", session.id)?;
    Ok(())
}

fn require_active(db: &Database) -> Result<SessionRecord> {
    match db.active_session()? {
        Some(session) => Ok(session),
        None => bail!("no active session"),
    }
}

/// Resolves a 1-based exercise index within the active session.
fn active_exercise(
    db: &Database,
    index: usize,
) -> Result<(SessionRecord, SessionExerciseRecord)> {
    let session = require_active(db)?;
    let exercises = db.list_session_exercises(&session.id)?;
    let Some(exercise) = index.checked_sub(1).and_then(|i| exercises.get(i)) else {
        bail!(
            "no exercise at index {index} (session has {})",
            exercises.len()
        );
    };
    Ok((session, exercise.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use wt_core::MuscleGroup;

    use crate::PlanExerciseArgs;

    fn ts(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).single().unwrap()
            + Duration::seconds(seconds)
    }

    fn log_args(exercise: usize) -> LogSetArgs {
        LogSetArgs {
            exercise,
            reps: None,
            duration: None,
            weight: None,
            side: None,
        }
    }

    fn edit_args(exercise: usize) -> EditExerciseArgs {
        EditExerciseArgs {
            exercise,
            actual_sets: None,
            actual_reps: None,
            actual_duration: None,
            planned_sets: None,
            planned_reps: None,
            planned_duration: None,
            planned_rest: None,
        }
    }

    /// Seeds one plan ("Push Day") with a rep-based and a duration-based
    /// exercise and returns the database.
    fn seeded_db() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();

        super::super::exercise::add(
            &mut db,
            &mut out,
            "Bench Press",
            MuscleGroup::Chest,
            None,
            false,
            ts(0),
        )
        .unwrap();
        super::super::exercise::add(
            &mut db,
            &mut out,
            "Side Plank",
            MuscleGroup::Abs,
            None,
            true,
            ts(0),
        )
        .unwrap();
        super::super::plan::create(&mut db, &mut out, "Push Day", None, ts(0)).unwrap();

        let mut bench = PlanExerciseArgs {
            plan: "Push Day".to_string(),
            exercise: "Bench Press".to_string(),
            sets: Some(3),
            reps: Some(10),
            duration: None,
            rest: Some(30),
            rest_after: None,
            set_time: None,
            scope: None,
            scope_repeat: None,
        };
        super::super::plan::add_exercise(&mut db, &mut out, &bench, ts(0)).unwrap();

        bench.exercise = "Side Plank".to_string();
        bench.sets = Some(2);
        bench.reps = None;
        bench.duration = Some(45);
        super::super::plan::add_exercise(&mut db, &mut out, &bench, ts(0)).unwrap();

        db
    }

    #[test]
    fn start_requires_a_known_plan_and_no_active_session() {
        let mut db = seeded_db();
        let mut out = Vec::new();

        assert!(start(&mut db, &mut out, "Leg Day", ts(0)).is_err());
        start(&mut db, &mut out, "Push Day", ts(0)).unwrap();
        assert!(start(&mut db, &mut out, "Push Day", ts(1)).is_err());
    }

    #[test]
    fn finish_aggregates_reps_and_duration() {
        let mut db = seeded_db();
        let mut out = Vec::new();
        start(&mut db, &mut out, "Push Day", ts(0)).unwrap();

        let mut set = log_args(1);
        set.reps = Some(10);
        log_set(&mut db, &mut out, &set, ts(60)).unwrap();
        set.reps = Some(8);
        log_set(&mut db, &mut out, &set, ts(120)).unwrap();

        // Side plank: one duration per side; the exercise's duration is the
        // longer side, not the total.
        let mut side = log_args(2);
        side.duration = Some(40);
        side.side = Some(1);
        log_set(&mut db, &mut out, &side, ts(180)).unwrap();
        side.duration = Some(47);
        side.side = Some(2);
        log_set(&mut db, &mut out, &side, ts(240)).unwrap();

        out.clear();
        finish(&mut db, &mut out, ts(300)).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Bench Press: 2 sets, 18 reps, -"));
        assert!(text.contains("Side Plank: 2 sets, 0 reps, 47s"));
        assert!(text.contains("Finished session (5m 00s active)"));
        assert!(db.active_session().unwrap().is_none());
    }

    #[test]
    fn pause_resume_only_counts_running_time() {
        let mut db = seeded_db();
        let mut out = Vec::new();
        start(&mut db, &mut out, "Push Day", ts(0)).unwrap();

        pause(&mut db, &mut out, ts(120)).unwrap();
        // Pausing twice is rejected.
        assert!(pause(&mut db, &mut out, ts(130)).is_err());

        resume(&mut db, &mut out, ts(300)).unwrap();
        assert!(resume(&mut db, &mut out, ts(310)).is_err());

        out.clear();
        finish(&mut db, &mut out, ts(330)).unwrap();
        let text = String::from_utf8(out).unwrap();
        // 120s before the pause + 30s after the resume.
        assert!(text.contains("Finished session (2m 30s active)"));
    }

    #[test]
    fn finish_while_paused_adds_no_time() {
        let mut db = seeded_db();
        let mut out = Vec::new();
        start(&mut db, &mut out, "Push Day", ts(0)).unwrap();
        pause(&mut db, &mut out, ts(60)).unwrap();

        out.clear();
        finish(&mut db, &mut out, ts(600)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Finished session (1m 00s active)"));
    }

    #[test]
    fn edit_applies_overrides_and_partial_planned_updates() {
        let mut db = seeded_db();
        let mut out = Vec::new();
        start(&mut db, &mut out, "Push Day", ts(0)).unwrap();

        let mut set = log_args(1);
        set.reps = Some(10);
        log_set(&mut db, &mut out, &set, ts(60)).unwrap();

        // Explicit zero overrides the derived count; planned_reps updates
        // without touching the other planned fields.
        let mut args = edit_args(1);
        args.actual_sets = Some(0);
        args.planned_reps = Some(12);
        edit(&mut db, &mut out, &args).unwrap();

        let session = db.active_session().unwrap().unwrap();
        let exercises = db.list_session_exercises(&session.id).unwrap();
        assert_eq!(exercises[0].actual_sets, Some(0));
        assert_eq!(exercises[0].actual_reps, Some(10));
        assert_eq!(exercises[0].planned_reps, Some(12));
        assert_eq!(exercises[0].planned_sets, Some(3));
        assert_eq!(exercises[0].planned_rest_seconds, Some(30));
    }

    #[test]
    fn logging_a_weighted_set_tracks_personal_records() {
        let mut db = seeded_db();
        let mut out = Vec::new();
        start(&mut db, &mut out, "Push Day", ts(0)).unwrap();

        let mut set = log_args(1);
        set.reps = Some(10);
        set.weight = Some(60.0);
        out.clear();
        log_set(&mut db, &mut out, &set, ts(60)).unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.contains("New personal record for Bench Press"));

        // A lighter set does not replace the record.
        set.weight = Some(40.0);
        out.clear();
        log_set(&mut db, &mut out, &set, ts(120)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("New personal record"));

        let records = db.list_personal_records(10).unwrap();
        assert_eq!(records.len(), 1);
        assert!((records[0].weight_kg - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cancel_discards_the_active_session() {
        let mut db = seeded_db();
        let mut out = Vec::new();
        start(&mut db, &mut out, "Push Day", ts(0)).unwrap();
        cancel(&mut db, &mut out).unwrap();
        assert!(db.active_session().unwrap().is_none());
        assert!(cancel(&mut db, &mut out).is_err());
    }

    #[test]
    fn log_rejects_out_of_range_index() {
        let mut db = seeded_db();
        let mut out = Vec::new();
        start(&mut db, &mut out, "Push Day", ts(0)).unwrap();
        assert!(log_set(&mut db, &mut out, &log_args(0), ts(1)).is_err());
        assert!(log_set(&mut db, &mut out, &log_args(3), ts(1)).is_err());
    }
}
