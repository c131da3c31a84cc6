//! End-to-end tests for the complete workout tracking flow.
//!
//! Tests the full pipeline: exercise library → plan with estimates →
//! session with logged sets → aggregation on finish.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn wt_binary() -> String {
    env!("CARGO_BIN_EXE_wt").to_string()
}

/// Runs `wt` against a database inside the given temp directory.
fn wt(temp: &Path, args: &[&str]) -> Output {
    Command::new(wt_binary())
        .env("WT_DATABASE_PATH", temp.join("wt.db"))
        .args(args)
        .output()
        .expect("failed to run wt")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "wt should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_full_session_flow() {
    let temp = TempDir::new().unwrap();

    stdout_of(&wt(
        temp.path(),
        &["exercise", "add", "Bench Press", "--muscle", "chest"],
    ));
    stdout_of(&wt(
        temp.path(),
        &["exercise", "add", "Plank", "--muscle", "abs"],
    ));

    stdout_of(&wt(temp.path(), &["plan", "create", "Push Day"]));
    // 10*5*3 + 2*30 = 210 seconds
    stdout_of(&wt(
        temp.path(),
        &[
            "plan",
            "add-exercise",
            "Push Day",
            "Bench Press",
            "--sets",
            "3",
            "--reps",
            "10",
            "--rest",
            "30",
        ],
    ));
    // 60*2 + 1*30 = 150 seconds; plan total 360
    stdout_of(&wt(
        temp.path(),
        &[
            "plan",
            "add-exercise",
            "Push Day",
            "Plank",
            "--sets",
            "2",
            "--duration",
            "60",
            "--rest",
            "30",
        ],
    ));

    let show = stdout_of(&wt(temp.path(), &["plan", "show", "Push Day"]));
    assert!(
        show.contains("Estimated total: 6m 00s"),
        "plan show should carry the estimate: {show}"
    );

    let start = stdout_of(&wt(temp.path(), &["session", "start", "Push Day"]));
    assert!(start.contains("Started session for Push Day"));

    let log = stdout_of(&wt(
        temp.path(),
        &[
            "session", "log", "1", "--reps", "10", "--weight", "60",
        ],
    ));
    assert!(log.contains("Logged set 1 for Bench Press"));
    assert!(log.contains("New personal record for Bench Press"));

    stdout_of(&wt(
        temp.path(),
        &["session", "log", "1", "--reps", "8", "--weight", "60"],
    ));
    stdout_of(&wt(
        temp.path(),
        &["session", "log", "2", "--duration", "55", "--side", "1"],
    ));
    stdout_of(&wt(
        temp.path(),
        &["session", "log", "2", "--duration", "62", "--side", "2"],
    ));

    let finish = stdout_of(&wt(temp.path(), &["session", "finish"]));
    assert!(
        finish.contains("Bench Press: 2 sets, 18 reps, -"),
        "reps should sum across sets: {finish}"
    );
    assert!(
        finish.contains("Plank: 2 sets, 0 reps, 62s"),
        "duration should be the max, not the sum: {finish}"
    );

    let status = stdout_of(&wt(temp.path(), &["status"]));
    assert!(status.contains("Exercises: 2, plans: 1, sessions: 1"));
    assert!(status.contains("No active session."));
    assert!(status.contains("Bench Press: 60kg x 10"));
}

#[test]
fn test_pause_resume_flow() {
    let temp = TempDir::new().unwrap();

    stdout_of(&wt(
        temp.path(),
        &["exercise", "add", "Squat", "--muscle", "quads"],
    ));
    stdout_of(&wt(temp.path(), &["plan", "create", "Leg Day"]));
    stdout_of(&wt(
        temp.path(),
        &[
            "plan",
            "add-exercise",
            "Leg Day",
            "Squat",
            "--sets",
            "3",
            "--reps",
            "5",
        ],
    ));

    stdout_of(&wt(temp.path(), &["session", "start", "Leg Day"]));

    let pause = stdout_of(&wt(temp.path(), &["session", "pause"]));
    assert!(pause.contains("Paused"));

    // Pausing a paused timer fails.
    let output = wt(temp.path(), &["session", "pause"]);
    assert!(!output.status.success());

    let resume = stdout_of(&wt(temp.path(), &["session", "resume"]));
    assert!(resume.contains("Resumed"));

    let show = stdout_of(&wt(temp.path(), &["session", "show"]));
    assert!(show.contains("running"));
    assert!(show.contains("1. Squat — 0/3 sets logged"));

    stdout_of(&wt(temp.path(), &["session", "cancel"]));
    let status = stdout_of(&wt(temp.path(), &["status"]));
    assert!(status.contains("No active session."));
}

#[test]
fn test_errors_do_not_touch_the_library() {
    let temp = TempDir::new().unwrap();

    // Unknown muscle group is rejected by argument parsing.
    let output = wt(
        temp.path(),
        &["exercise", "add", "Neck Curl", "--muscle", "neck"],
    );
    assert!(!output.status.success());

    // Session commands require an active session.
    let output = wt(temp.path(), &["session", "finish"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no active session"));

    let list = stdout_of(&wt(temp.path(), &["exercise", "list"]));
    assert!(list.contains("No exercises."));
}
