//! Workout plan commands: the plan service.
//!
//! Every plan mutation reruns the estimation engine: the appended row gets
//! its own estimate and the plan's `estimated_total_time_seconds` is
//! recomputed from all rows (singles plus scope blocks).

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use wt_core::{exercise_estimated_time_seconds, plan_estimated_total_time_seconds};
use wt_db::{Database, PlanExerciseRecord, PlanRecord, format_timestamp};

use super::util::format_estimate;
use crate::PlanExerciseArgs;

pub fn create<W: Write>(
    db: &mut Database,
    writer: &mut W,
    name: &str,
    description: Option<String>,
    now: DateTime<Utc>,
) -> Result<()> {
    if db.find_plan(name)?.is_some() {
        bail!("plan `{name}` already exists");
    }

    let timestamp = format_timestamp(now);
    let plan = PlanRecord {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        description,
        estimated_total_time_seconds: None,
        created_at: timestamp.clone(),
        updated_at: timestamp,
    };
    db.insert_plan(&plan)
        .with_context(|| format!("failed to insert plan `{name}`"))?;

    writeln!(writer, "Created plan {name}")?;
    Ok(())
}

pub fn add_exercise<W: Write>(
    db: &mut Database,
    writer: &mut W,
    args: &PlanExerciseArgs,
    now: DateTime<Utc>,
) -> Result<()> {
    let Some(plan) = db.find_plan(&args.plan)? else {
        bail!("no plan named `{}`", args.plan);
    };
    let Some(exercise) = db.find_exercise(&args.exercise)? else {
        bail!("no exercise named `{}`", args.exercise);
    };

    let scope_repeat_count = resolve_scope_repeat(db, &plan.id, args)?;

    let mut row = PlanExerciseRecord {
        id: Uuid::new_v4().to_string(),
        plan_id: plan.id.clone(),
        exercise_id: exercise.id,
        exercise_name: exercise.name,
        order_index: db.next_plan_exercise_order(&plan.id)?,
        scope_id: args.scope.clone(),
        scope_repeat_count,
        planned_sets: args.sets,
        planned_reps: args.reps,
        planned_duration_seconds: args.duration,
        planned_rest_seconds: args.rest,
        planned_rest_after_series_seconds: args.rest_after,
        estimated_set_time_seconds: args.set_time,
        estimated_time_seconds: None,
    };
    row.estimated_time_seconds = exercise_estimated_time_seconds(&row.time_params());
    db.insert_plan_exercise(&row)?;

    let total = recompute_plan_estimate(db, &plan.id, now)?;
    tracing::debug!(
        plan = %args.plan,
        exercise_estimate = ?row.estimated_time_seconds,
        plan_estimate = ?total,
        "recomputed plan estimate"
    );

    writeln!(
        writer,
        "Added {} to {} (exercise: {}, plan total: {})",
        args.exercise,
        args.plan,
        format_estimate(row.estimated_time_seconds),
        format_estimate(total),
    )?;
    Ok(())
}

/// Keeps repeat counts consistent inside a scope: members inherit the
/// existing value, and a conflicting explicit value is rejected.
fn resolve_scope_repeat(
    db: &Database,
    plan_id: &str,
    args: &PlanExerciseArgs,
) -> Result<Option<i64>> {
    let Some(scope_id) = args.scope.as_deref() else {
        return Ok(None);
    };

    let existing = db
        .list_plan_exercises(plan_id)?
        .into_iter()
        .find(|row| row.scope_id.as_deref() == Some(scope_id))
        .and_then(|row| row.scope_repeat_count);

    match (existing, args.scope_repeat) {
        (Some(current), Some(requested)) if current != requested => {
            bail!("scope `{scope_id}` already repeats {current} times");
        }
        (Some(current), _) => Ok(Some(current)),
        (None, requested) => Ok(Some(requested.unwrap_or(1).max(1))),
    }
}

/// Recomputes and persists the plan's estimated total. Returns the total.
fn recompute_plan_estimate(
    db: &mut Database,
    plan_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<i64>> {
    let times: Vec<wt_core::PlanExerciseTime> = db
        .list_plan_exercises(plan_id)?
        .iter()
        .map(PlanExerciseRecord::plan_time)
        .collect();
    let total = plan_estimated_total_time_seconds(&times);
    db.set_plan_estimated_total(plan_id, total, &format_timestamp(now))?;
    Ok(total)
}

pub fn list<W: Write>(db: &Database, writer: &mut W, json: bool) -> Result<()> {
    let plans = db.list_plans()?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&plans)?)?;
        return Ok(());
    }

    if plans.is_empty() {
        writeln!(writer, "No plans.")?;
        return Ok(());
    }

    for plan in plans {
        writeln!(
            writer,
            "- {} (estimated {})",
            plan.name,
            format_estimate(plan.estimated_total_time_seconds)
        )?;
    }
    Ok(())
}

pub fn show<W: Write>(db: &Database, writer: &mut W, plan_name: &str) -> Result<()> {
    let Some(plan) = db.find_plan(plan_name)? else {
        bail!("no plan named `{plan_name}`");
    };

    writeln!(writer, "Plan: {}", plan.name)?;
    if let Some(description) = &plan.description {
        writeln!(writer, "{description}")?;
    }
    writeln!(
        writer,
        "Estimated total: {}",
        format_estimate(plan.estimated_total_time_seconds)
    )?;

    let rows = db.list_plan_exercises(&plan.id)?;
    if rows.is_empty() {
        writeln!(writer, "No exercises yet.")?;
        return Ok(());
    }

    for (index, row) in rows.iter().enumerate() {
        let target = match (row.planned_reps, row.planned_duration_seconds) {
            (_, Some(duration)) => format!("{duration}s"),
            (Some(reps), None) => format!("{reps} reps"),
            (None, None) => "-".to_string(),
        };
        let scope = row
            .scope_id
            .as_deref()
            .map(|scope_id| {
                let repeat = row.scope_repeat_count.unwrap_or(1);
                format!(" [scope {scope_id} x{repeat}]")
            })
            .unwrap_or_default();
        writeln!(
            writer,
            "{}. {} — {} sets x {}{} (estimated {})",
            index + 1,
            row.exercise_name,
            row.planned_sets.unwrap_or(0),
            target,
            scope,
            format_estimate(row.estimated_time_seconds),
        )?;
    }
    Ok(())
}

pub fn delete<W: Write>(db: &mut Database, writer: &mut W, plan_name: &str) -> Result<()> {
    if db.delete_plan(plan_name)? {
        writeln!(writer, "Deleted {plan_name}")?;
    } else {
        bail!("no plan named `{plan_name}`");
    }
    Ok(())
}
