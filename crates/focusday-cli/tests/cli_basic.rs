//! Basic CLI E2E tests.
//!
//! Each test runs the binary against its own temporary home directory, so
//! config and database never touch the user's files.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_focusday"))
        .args(args)
        .env("HOME", home)
        .env_remove("FOCUSDAY_ENV")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    stdout
}

#[test]
fn test_activity_add_and_list() {
    let home = tempfile::tempdir().unwrap();
    run_cli_success(
        home.path(),
        &["activity", "add", "Teme", "--start", "9:00", "--end", "10:30", "--repeat", "everyday"],
    );

    let stdout = run_cli_success(home.path(), &["activity", "list", "--json"]);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows[0]["index"], 0);
    assert_eq!(rows[0]["activity"]["name"], "Teme");
    assert_eq!(rows[0]["activity"]["endMinute"], 30);
}

#[test]
fn test_invalid_activity_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(
        home.path(),
        &["activity", "add", "Invers", "--start", "10:00", "--end", "9:00"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "{stderr}");

    let stdout = run_cli_success(home.path(), &["activity", "list", "--json"]);
    assert_eq!(stdout.trim(), "[]");
}

#[test]
fn test_day_share() {
    let home = tempfile::tempdir().unwrap();
    run_cli_success(
        home.path(),
        &[
            "activity", "add", "Curs", "--start", "9", "--end", "10", "--repeat", "weekdays",
            "--date", "2026-10-19",
        ],
    );
    let stdout = run_cli_success(home.path(), &["day", "--date", "2026-10-20", "--share"]);
    assert_eq!(stdout.trim(), "6:00 - 9:00, 10:00 - 20:00");

    let weekend = run_cli_success(home.path(), &["day", "--date", "2026-10-24", "--share"]);
    assert_eq!(weekend.trim(), "6:00 - 20:00");
}

#[test]
fn test_week_label() {
    let home = tempfile::tempdir().unwrap();
    let stdout = run_cli_success(home.path(), &["week", "--date", "2026-10-21"]);
    assert!(stdout.starts_with("19-25 octombrie 2026"), "{stdout}");
}

#[test]
fn test_banned_and_journal() {
    let home = tempfile::tempdir().unwrap();
    run_cli_success(home.path(), &["banned", "add", "com.instagram.android"]);
    let listed = run_cli_success(home.path(), &["banned", "list"]);
    assert_eq!(listed.trim(), "com.instagram.android");

    run_cli_success(
        home.path(),
        &["journal", "write", "Zi productiva", "--date", "2026-10-19"],
    );
    let entry = run_cli_success(home.path(), &["journal", "show", "--date", "2026-10-19"]);
    assert_eq!(entry.trim(), "Zi productiva");
}

#[test]
fn test_config_get_set() {
    let home = tempfile::tempdir().unwrap();
    run_cli_success(home.path(), &["config", "init"]);
    run_cli_success(home.path(), &["config", "set", "availability.start_hour", "8"]);
    let value = run_cli_success(home.path(), &["config", "get", "availability.start_hour"]);
    assert_eq!(value.trim(), "8");

    let (_, _, code) = run_cli(home.path(), &["config", "set", "availability.start_hour", "23"]);
    assert_eq!(code, 1);
}

#[test]
fn test_session_of_past_activity_is_rated_and_counted() {
    let home = tempfile::tempdir().unwrap();
    run_cli_success(home.path(), &["config", "set", "session.tick_interval_ms", "10"]);
    // Ends at 00:01, so the countdown is already at zero.
    run_cli_success(
        home.path(),
        &["activity", "add", "Devreme", "--start", "0:00", "--end", "0:01", "--repeat", "everyday"],
    );

    let rated = run_cli_success(home.path(), &["session", "run", "0", "--rating", "4"]);
    let record: serde_json::Value = serde_json::from_str(rated.trim()).unwrap();
    assert_eq!(record["rating"], 4);
    assert_eq!(record["passed"], true);

    let stats = run_cli_success(home.path(), &["stats", "--json"]);
    let report: serde_json::Value = serde_json::from_str(&stats).unwrap();
    assert_eq!(report["activities"][0]["average_rating"], 4.0);
    assert_eq!(report["activities"][0]["streak"], 1);
}

#[test]
fn test_reset_requires_confirmation() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["reset"]);
    assert_eq!(code, 1);
    run_cli_success(home.path(), &["reset", "--yes"]);
}

#[test]
fn test_session_of_unscheduled_activity_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    run_cli_success(
        home.path(),
        &[
            "activity", "add", "Examen", "--start", "0:00", "--end", "0:01", "--repeat", "one-time",
            "--date", "2000-01-03",
        ],
    );

    let (_, stderr, code) = run_cli(home.path(), &["session", "run", "0", "--rating", "5"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not scheduled"), "{stderr}");

    let stats = run_cli_success(home.path(), &["stats", "--json"]);
    let report: serde_json::Value = serde_json::from_str(&stats).unwrap();
    let activities = report["activities"].as_array().unwrap();
    assert!(activities.iter().all(|a| a["sessions"] == 0), "{stats}");
}
