//! Exercise library commands.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use wt_core::MuscleGroup;
use wt_db::{Database, ExerciseRecord, format_timestamp};

pub fn add<W: Write>(
    db: &mut Database,
    writer: &mut W,
    name: &str,
    muscle: MuscleGroup,
    description: Option<String>,
    unilateral: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    if db.find_exercise(name)?.is_some() {
        bail!("exercise `{name}` already exists");
    }

    let exercise = ExerciseRecord {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        muscle: muscle.to_string(),
        description,
        unilateral,
        created_at: format_timestamp(now),
    };
    db.insert_exercise(&exercise)
        .with_context(|| format!("failed to insert exercise `{name}`"))?;

    writeln!(writer, "Added {name} ({muscle})")?;
    Ok(())
}

pub fn list<W: Write>(
    db: &Database,
    writer: &mut W,
    muscle: Option<MuscleGroup>,
    json: bool,
) -> Result<()> {
    let exercises = db.list_exercises(muscle.map(|m| m.as_str()))?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&exercises)?)?;
        return Ok(());
    }

    if exercises.is_empty() {
        writeln!(writer, "No exercises.")?;
        return Ok(());
    }

    for exercise in exercises {
        let unilateral = if exercise.unilateral {
            " (unilateral)"
        } else {
            ""
        };
        match &exercise.description {
            Some(description) => writeln!(
                writer,
                "- {} [{}]{unilateral} — {description}",
                exercise.name, exercise.muscle
            )?,
            None => writeln!(
                writer,
                "- {} [{}]{unilateral}",
                exercise.name, exercise.muscle
            )?,
        }
    }
    Ok(())
}

pub fn delete<W: Write>(db: &mut Database, writer: &mut W, name: &str) -> Result<()> {
    if db.delete_exercise(name)? {
        writeln!(writer, "Deleted {name}")?;
    } else {
        bail!("no exercise named `{name}`");
    }
    Ok(())
}
