//! Status command for showing tracker state at a glance.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use wt_db::{Database, PersonalRecordRow, SessionRecord, StatusCounts};

use super::util::format_seconds;

/// How many recent personal records the status view shows.
const RECENT_RECORDS: i64 = 5;

#[derive(Debug, Serialize)]
struct Status {
    database_path: String,
    counts: StatusCounts,
    active_session: Option<SessionRecord>,
    recent_records: Vec<PersonalRecordRow>,
}

pub fn run<W: Write>(
    db: &Database,
    writer: &mut W,
    database_path: &Path,
    json: bool,
) -> Result<()> {
    let status = Status {
        database_path: database_path.display().to_string(),
        counts: db.status_counts()?,
        active_session: db.active_session()?,
        recent_records: db.list_personal_records(RECENT_RECORDS)?,
    };

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&status)?)?;
        return Ok(());
    }

    writeln!(writer, "Workout tracker status")?;
    writeln!(writer, "Database: {}", status.database_path)?;
    writeln!(
        writer,
        "Exercises: {}, plans: {}, sessions: {}",
        status.counts.exercises, status.counts.plans, status.counts.sessions
    )?;

    match &status.active_session {
        Some(session) => {
            let plan_name = session.plan_name.as_deref().unwrap_or("(no plan)");
            let state = if session.is_running() {
                "running"
            } else {
                "paused"
            };
            writeln!(
                writer,
                "Active session: {plan_name} ({} active, {state})",
                format_seconds(session.active_duration_seconds)
            )?;
        }
        None => writeln!(writer, "No active session.")?,
    }

    if !status.recent_records.is_empty() {
        writeln!(writer, "Recent personal records:")?;
        for record in &status.recent_records {
            writeln!(
                writer,
                "- {}: {}kg x {} ({:.1} est. 1RM)",
                record.exercise_name, record.weight_kg, record.reps, record.estimated_one_rep_max
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn status_reports_counts_and_no_active_session() {
        let db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        run(&db, &mut out, &PathBuf::from("/tmp/wt.db"), false).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Exercises: 0, plans: 0, sessions: 0"));
        assert!(text.contains("No active session."));
    }

    #[test]
    fn status_json_is_parseable() {
        let db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        run(&db, &mut out, &PathBuf::from("/tmp/wt.db"), true).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["counts"]["exercises"], 0);
        assert!(parsed["active_session"].is_null());
    }
}
