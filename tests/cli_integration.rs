//! Integration tests for the `tick` CLI.
//!
//! Each test points `tick` at a temp data directory with `-C`, runs it as a
//! subprocess, and checks stdout and/or the stored blob.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use pretty_assertions::assert_eq;

fn tick_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_tick"))
}

/// Run `tick` against `dir` with optional stdin, returning (stdout, stderr, success).
fn run_tick_with_input(dir: &Path, args: &[&str], input: &str) -> (String, String, bool) {
    let mut child = Command::new(tick_bin())
        .arg("-C")
        .arg(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run tick");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn run_tick(dir: &Path, args: &[&str]) -> (String, String, bool) {
    run_tick_with_input(dir, args, "")
}

/// Run `tick` expecting success, return stdout.
fn run_tick_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_tick(dir, args);
    if !success {
        panic!(
            "tick {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

fn add(dir: &Path, text: &str, category: &str) -> String {
    run_tick_ok(dir, &["add", text, "-c", category])
        .trim()
        .to_string()
}

fn blob_path(dir: &Path) -> PathBuf {
    dir.join("todos.v1.json")
}

fn stored(dir: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(blob_path(dir)).unwrap()).unwrap()
}

/// A blob with fixed timestamps (noon UTC) for stats tests.
fn write_fixture(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    // 2026-03-14T12:00Z, 2026-03-12T12:00Z, 2026-03-05T12:00Z, 2026-02-27T12:00Z
    fs::write(
        blob_path(dir),
        r#"[
  {"id":"4","text":"Invoice","completed":true,"createdAt":1773489600000,"category":"Work"},
  {"id":"3","text":"Groceries","completed":true,"createdAt":1773316800000,"category":"Shopping"},
  {"id":"2","text":"Call mom","completed":false,"createdAt":1772712000000,"category":"Personal"},
  {"id":"1","text":"Old report","completed":true,"createdAt":1772193600000,"category":"Work"}
]"#,
    )
    .unwrap();
}

// ---------------------------------------------------------------------------
// Todo commands
// ---------------------------------------------------------------------------

#[test]
fn test_add_and_list() {
    let tmp = tempfile::TempDir::new().unwrap();
    let id = add(tmp.path(), "  Buy milk ", "Shopping");
    assert!(id.parse::<i64>().is_ok());

    let out = run_tick_ok(tmp.path(), &["list"]);
    assert!(out.contains("[ ]"));
    assert!(out.contains(&id));
    assert!(out.contains("Buy milk"));
    assert!(out.contains("Shopping"));

    let blob = stored(tmp.path());
    assert_eq!(blob[0]["text"], "Buy milk");
    assert_eq!(blob[0]["completed"], false);
}

#[test]
fn test_add_newest_first() {
    let tmp = tempfile::TempDir::new().unwrap();
    add(tmp.path(), "first", "Work");
    add(tmp.path(), "second", "Work");
    let blob = stored(tmp.path());
    assert_eq!(blob[0]["text"], "second");
    assert_eq!(blob[1]["text"], "first");
}

#[test]
fn test_add_blank_is_a_no_op() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_tick_ok(tmp.path(), &["add", "   "]);
    assert_eq!(out.trim(), "nothing added: text is empty");
    assert!(!blob_path(tmp.path()).exists());
}

#[test]
fn test_add_uses_default_category() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_tick_ok(tmp.path(), &["add", "Stretch"]);
    assert_eq!(stored(tmp.path())[0]["category"], "Personal");
}

#[test]
fn test_worked_example() {
    let tmp = tempfile::TempDir::new().unwrap();
    let milk = add(tmp.path(), "Buy milk", "Shopping");
    add(tmp.path(), "Pay rent", "Personal");

    let out = run_tick_ok(tmp.path(), &["toggle", &milk]);
    assert_eq!(out.trim(), format!("{} completed", milk));

    let out = run_tick_ok(tmp.path(), &["list", "--status", "completed", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    let arr = parsed.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["text"], "Buy milk");
    assert_eq!(arr[0]["completed"], true);
}

#[test]
fn test_list_category_filter() {
    let tmp = tempfile::TempDir::new().unwrap();
    add(tmp.path(), "Buy milk", "Shopping");
    add(tmp.path(), "Standup", "Work");

    let out = run_tick_ok(tmp.path(), &["list", "-c", "Work"]);
    assert!(out.contains("Standup"));
    assert!(!out.contains("Buy milk"));

    let out = run_tick_ok(tmp.path(), &["list", "-c", "All"]);
    assert!(out.contains("Standup"));
    assert!(out.contains("Buy milk"));
}

#[test]
fn test_list_invalid_status() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_, stderr, success) = run_tick(tmp.path(), &["list", "--status", "someday"]);
    assert!(!success);
    assert!(stderr.contains("invalid status"));
}

#[test]
fn test_list_empty() {
    let tmp = tempfile::TempDir::new().unwrap();
    assert_eq!(run_tick_ok(tmp.path(), &["list"]).trim(), "no todos");
}

#[test]
fn test_toggle_unknown_id() {
    let tmp = tempfile::TempDir::new().unwrap();
    add(tmp.path(), "Buy milk", "Shopping");
    let before = fs::read_to_string(blob_path(tmp.path())).unwrap();
    let out = run_tick_ok(tmp.path(), &["toggle", "42"]);
    assert!(out.contains("no todo with id 42"));
    assert_eq!(fs::read_to_string(blob_path(tmp.path())).unwrap(), before);
}

#[test]
fn test_edit_text_and_category() {
    let tmp = tempfile::TempDir::new().unwrap();
    let id = add(tmp.path(), "Buy milk", "Shopping");
    run_tick_ok(tmp.path(), &["toggle", &id]);
    run_tick_ok(tmp.path(), &["edit", &id, "Buy oat milk", "-c", "Health"]);

    let blob = stored(tmp.path());
    assert_eq!(blob[0]["id"], id.as_str());
    assert_eq!(blob[0]["text"], "Buy oat milk");
    assert_eq!(blob[0]["category"], "Health");
    assert_eq!(blob[0]["completed"], true);
}

#[test]
fn test_edit_blank_text_is_a_no_op() {
    let tmp = tempfile::TempDir::new().unwrap();
    let id = add(tmp.path(), "Buy milk", "Shopping");
    let out = run_tick_ok(tmp.path(), &["edit", &id, "  "]);
    assert_eq!(out.trim(), format!("{} unchanged: text is empty", id));
    assert_eq!(stored(tmp.path())[0]["text"], "Buy milk");
}

#[test]
fn test_rm_with_yes() {
    let tmp = tempfile::TempDir::new().unwrap();
    let id = add(tmp.path(), "Buy milk", "Shopping");
    add(tmp.path(), "Pay rent", "Personal");
    let out = run_tick_ok(tmp.path(), &["rm", &id, "--yes"]);
    assert!(out.contains("deleted"));
    let blob = stored(tmp.path());
    assert_eq!(blob.as_array().unwrap().len(), 1);
    assert_eq!(blob[0]["text"], "Pay rent");
}

#[test]
fn test_rm_prompt_declined() {
    let tmp = tempfile::TempDir::new().unwrap();
    let id = add(tmp.path(), "Buy milk", "Shopping");
    let (stdout, stderr, success) = run_tick_with_input(tmp.path(), &["rm", &id], "n\n");
    assert!(success);
    assert!(stderr.contains("Delete \"Buy milk\"?"));
    assert!(stdout.contains("kept"));
    assert_eq!(stored(tmp.path()).as_array().unwrap().len(), 1);
}

#[test]
fn test_rm_prompt_accepted() {
    let tmp = tempfile::TempDir::new().unwrap();
    let id = add(tmp.path(), "Buy milk", "Shopping");
    let (stdout, _, success) = run_tick_with_input(tmp.path(), &["rm", &id], "y\n");
    assert!(success);
    assert!(stdout.contains("deleted"));
    assert!(stored(tmp.path()).as_array().unwrap().is_empty());
}

#[test]
fn test_clear_completed() {
    let tmp = tempfile::TempDir::new().unwrap();
    let a = add(tmp.path(), "a", "Work");
    add(tmp.path(), "b", "Work");
    let c = add(tmp.path(), "c", "Work");
    run_tick_ok(tmp.path(), &["toggle", &a]);
    run_tick_ok(tmp.path(), &["toggle", &c]);

    let out = run_tick_ok(tmp.path(), &["clear", "--yes"]);
    assert_eq!(out.trim(), "removed 2 completed");
    let blob = stored(tmp.path());
    assert_eq!(blob.as_array().unwrap().len(), 1);
    assert_eq!(blob[0]["text"], "b");

    let out = run_tick_ok(tmp.path(), &["clear", "--yes"]);
    assert_eq!(out.trim(), "no completed todos");
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

#[test]
fn test_stats_month_window_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    write_fixture(tmp.path());
    let out = run_tick_ok(tmp.path(), &["stats", "--date", "2026-03-14", "--json"]);
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(report["date"], "2026-03-14");
    assert_eq!(report["window"], "month");
    assert_eq!(
        report["activity"]["labels"],
        serde_json::json!([8, 9, 10, 11, 12, 13, 14])
    );
    assert_eq!(
        report["activity"]["created"],
        serde_json::json!([0, 0, 0, 0, 1, 0, 1])
    );
    assert_eq!(report["month"]["total"], 3);
    assert_eq!(report["month"]["completed"], 2);
    assert_eq!(report["month"]["percent"], 67);

    let rates = report["categories"].as_array().unwrap();
    assert_eq!(rates.len(), 5);
    assert_eq!(rates[0]["category"], "Personal");
    assert_eq!(rates[0]["rate"], 0);
    assert_eq!(rates[1]["category"], "Work");
    assert_eq!(rates[1]["rate"], 100);
}

#[test]
fn test_stats_month_start_clamped_and_rolling() {
    let tmp = tempfile::TempDir::new().unwrap();
    write_fixture(tmp.path());

    let out = run_tick_ok(tmp.path(), &["stats", "--date", "2026-03-02", "--json"]);
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["activity"]["labels"], serde_json::json!([1, 2]));

    let out = run_tick_ok(
        tmp.path(),
        &["stats", "--date", "2026-03-02", "--rolling", "--json"],
    );
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["window"], "rolling");
    assert_eq!(
        report["activity"]["labels"],
        serde_json::json!([24, 25, 26, 27, 28, 1, 2])
    );
    assert_eq!(
        report["activity"]["completed"],
        serde_json::json!([0, 0, 0, 1, 0, 0, 0])
    );
}

#[test]
fn test_stats_text() {
    let tmp = tempfile::TempDir::new().unwrap();
    write_fixture(tmp.path());
    let out = run_tick_ok(tmp.path(), &["stats", "--date", "2026-03-14"]);
    assert!(out.starts_with("Progress for 2026-03-14 (month window)"));
    assert!(out.contains("By category"));
    assert!(out.contains("This month: 3 tasks, 2 completed (67%)"));
}

#[test]
fn test_stats_invalid_date() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_, stderr, success) = run_tick(tmp.path(), &["stats", "--date", "14/03/2026"]);
    assert!(!success);
    assert!(stderr.contains("invalid date"));
}

// ---------------------------------------------------------------------------
// Config and categories
// ---------------------------------------------------------------------------

#[test]
fn test_init_and_force() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_tick_ok(tmp.path(), &["init"]);
    assert!(out.contains("config.toml"));
    assert!(tmp.path().join("config.toml").exists());

    let (_, stderr, success) = run_tick(tmp.path(), &["init"]);
    assert!(!success);
    assert!(stderr.contains("already exists"));

    run_tick_ok(tmp.path(), &["init", "--force"]);
}

#[test]
fn test_categories_add_and_default() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_tick_ok(tmp.path(), &["categories", "add", "Errands"]);
    run_tick_ok(tmp.path(), &["categories", "default", "Errands"]);

    let out = run_tick_ok(tmp.path(), &["categories"]);
    assert!(out.contains("* Errands"));

    run_tick_ok(tmp.path(), &["add", "Post office"]);
    assert_eq!(stored(tmp.path())[0]["category"], "Errands");

    let out = run_tick_ok(tmp.path(), &["categories", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    let errands = parsed
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["label"] == "Errands")
        .unwrap();
    assert_eq!(errands["default"], true);
    assert_eq!(errands["todos"], 1);
}

#[cfg(unix)]
#[test]
fn test_categories_add_waits_for_data_lock() {
    use ticklist::io::lock::{DEFAULT_LOCK_TIMEOUT, DataLock};

    let tmp = tempfile::TempDir::new().unwrap();
    let held = DataLock::acquire(tmp.path(), DEFAULT_LOCK_TIMEOUT).unwrap();
    let (_, stderr, success) = run_tick(tmp.path(), &["categories", "add", "Errands"]);
    assert!(!success);
    assert!(stderr.contains("timed out"));
    assert!(!tmp.path().join("config.toml").exists());

    drop(held);
    run_tick_ok(tmp.path(), &["categories", "add", "Errands"]);
    let config = fs::read_to_string(tmp.path().join("config.toml")).unwrap();
    assert!(config.contains("Errands"));
}

#[test]
fn test_categories_default_unknown_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_, stderr, success) = run_tick(tmp.path(), &["categories", "default", "Nope"]);
    assert!(!success);
    assert!(stderr.contains("unknown category"));
}

#[test]
fn test_config_disables_confirm() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[ui]\nconfirm = false\n").unwrap();
    let id = add(tmp.path(), "Buy milk", "Shopping");
    let out = run_tick_ok(tmp.path(), &["rm", &id]);
    assert!(out.contains("deleted"));
}

// ---------------------------------------------------------------------------
// Storage failures
// ---------------------------------------------------------------------------

#[test]
fn test_corrupt_blob_is_reported_and_preserved() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(blob_path(tmp.path()), "{not json").unwrap();

    // Reads report and carry on
    let (stdout, stderr, success) = run_tick(tmp.path(), &["list"]);
    assert!(success);
    assert!(stderr.contains("Could not load your todos"));
    assert_eq!(stdout.trim(), "no todos");
    run_tick_ok(tmp.path(), &["stats"]);

    // Writes refuse to overwrite
    let (_, stderr, success) = run_tick(tmp.path(), &["add", "Buy milk"]);
    assert!(!success);
    assert!(stderr.contains("unreadable"));
    assert_eq!(
        fs::read_to_string(blob_path(tmp.path())).unwrap(),
        "{not json"
    );

    let out = run_tick_ok(tmp.path(), &["recovery", "--json"]);
    let entries: serde_json::Value = serde_json::from_str(&out).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["category"], "load");
    assert_eq!(entries[0]["body"], "{not json");
}

#[test]
fn test_recovery_empty() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_tick_ok(tmp.path(), &["recovery"]);
    assert_eq!(out.trim(), "recovery log is empty");
}
