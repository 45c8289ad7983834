//! End-to-end tests driving the `arya` binary the way desktop hooks do.
//!
//! Each test gets its own state, rules and XDG directories; timestamps are
//! passed with `--at` so durations are exact.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const RULES: &str = r#"{
    "formatVersion": "0.1",
    "projects": {"Facebook": ["Facebook"]},
    "projectSequence": ["Facebook"],
    "ignores": []
}"#;

fn arya_binary() -> String {
    env!("CARGO_BIN_EXE_arya").to_string()
}

struct Env {
    temp: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    fn state_path(&self) -> PathBuf {
        self.temp.path().join("data/activity.json")
    }

    fn rules_path(&self) -> PathBuf {
        self.temp.path().join("config/projects.json")
    }

    fn write_rules(&self, content: &str) {
        let path = self.rules_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn run(&self, args: &[&str]) -> Output {
        let home: &Path = self.temp.path();
        Command::new(arya_binary())
            .env("HOME", home)
            .env("XDG_CONFIG_HOME", home.join("xdg-config"))
            .env("XDG_DATA_HOME", home.join("xdg-data"))
            .env("ARYA_STATE_PATH", self.state_path())
            .env("ARYA_RULES_PATH", self.rules_path())
            .env_remove("RUST_LOG")
            .args(args)
            .output()
            .expect("failed to run arya")
    }

    fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "arya {} should succeed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn stats_json(&self, at: &str) -> serde_json::Value {
        let stdout = self.run_ok(&["stats", "--json", "--at", at]);
        serde_json::from_str(&stdout).unwrap()
    }
}

/// Minutes for `name` in one section of the JSON stats.
fn minutes(stats: &serde_json::Value, section: &str, name: &str) -> Option<i64> {
    stats[section]
        .as_array()?
        .iter()
        .find(|line| line["name"] == name)
        .and_then(|line| line["minutes"].as_i64())
}

fn millis(stats: &serde_json::Value, section: &str, name: &str) -> Option<i64> {
    stats[section]
        .as_array()?
        .iter()
        .find(|line| line["name"] == name)
        .and_then(|line| line["millis"].as_i64())
}

#[test]
fn test_title_switch_moves_time_between_projects() {
    let env = Env::new();
    env.write_rules(RULES);

    env.run_ok(&[
        "observe",
        "--app",
        "A",
        "--title",
        "Editing foo.txt",
        "--workspace",
        "Main",
        "--at",
        "2025-01-06T09:00:00Z",
    ]);
    env.run_ok(&[
        "observe",
        "--app",
        "A",
        "--title",
        "Facebook",
        "--workspace",
        "Main",
        "--at",
        "2025-01-06T09:05:00Z",
    ]);

    let stats = env.stats_json("2025-01-06T09:10:00Z");
    assert_eq!(millis(&stats, "projects", "No Project Defined"), Some(300_000));
    assert_eq!(millis(&stats, "projects", "Facebook"), Some(300_000));
    assert_eq!(stats["projects"].as_array().unwrap().len(), 2);
    assert_eq!(minutes(&stats, "apps", "A"), Some(10));
    assert_eq!(minutes(&stats, "workspaces", "Main"), Some(10));
    assert_eq!(stats["total_label"], "10 minutes");
}

#[test]
fn test_lock_pauses_until_unlock() {
    let env = Env::new();

    env.run_ok(&["observe", "--app", "A", "--title", "doc", "--at", "2025-01-06T09:00:00Z"]);
    env.run_ok(&["lock", "--at", "2025-01-06T09:10:00Z"]);
    env.run_ok(&["lock", "--at", "2025-01-06T09:15:00Z"]);

    let paused = env.stats_json("2025-01-06T09:20:00Z");
    assert_eq!(paused["paused"], true);
    assert_eq!(minutes(&paused, "apps", "PAUSED"), Some(10));

    env.run_ok(&["unlock", "--app", "B", "--title", "mail", "--at", "2025-01-06T09:30:00Z"]);

    let stats = env.stats_json("2025-01-06T09:40:00Z");
    assert_eq!(stats["paused"], false);
    assert_eq!(minutes(&stats, "apps", "A"), Some(10));
    assert_eq!(minutes(&stats, "apps", "PAUSED"), Some(20));
    assert_eq!(minutes(&stats, "apps", "B"), Some(10));
    assert_eq!(stats["total_minutes"], 20);
}

#[test]
fn test_reset_clears_history() {
    let env = Env::new();

    env.run_ok(&["observe", "--app", "A", "--title", "doc", "--at", "2025-01-06T09:00:00Z"]);
    let stdout = env.run_ok(&["reset", "--app", "B", "--title", "mail", "--at", "2025-01-06T10:00:00Z"]);
    assert_eq!(stdout, "History cleared.\n");

    let stats = env.stats_json("2025-01-06T10:05:00Z");
    assert_eq!(stats["created"], "2025-01-06T10:00:00Z");
    assert_eq!(minutes(&stats, "apps", "A"), None);
    assert_eq!(minutes(&stats, "apps", "B"), Some(5));
}

#[test]
fn test_corrupt_state_is_reported_and_keeps_last_good_backup() {
    let env = Env::new();
    env.run_ok(&["observe", "--app", "A", "--at", "2025-01-06T09:00:00Z"]);
    env.run_ok(&["observe", "--app", "B", "--at", "2025-01-06T09:05:00Z"]);

    let state = env.state_path();
    let mut backup = state.clone().into_os_string();
    backup.push(".bak");
    let backup = PathBuf::from(backup);
    let good_backup = std::fs::read_to_string(&backup).unwrap();
    assert!(good_backup.contains("\"A\""));

    std::fs::write(&state, "{\"formatVersion\": 1, \"created\": ").unwrap();

    let output = env.run(&["observe", "--app", "C", "--at", "2025-01-06T09:10:00Z"]);
    assert!(!output.status.success(), "corrupt state must not be overwritten");
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to restore"));

    assert_eq!(
        std::fs::read_to_string(&state).unwrap(),
        "{\"formatVersion\": 1, \"created\": "
    );
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), good_backup);
}

#[test]
fn test_stats_does_not_touch_backup() {
    let env = Env::new();
    env.run_ok(&["observe", "--app", "A", "--at", "2025-01-06T09:00:00Z"]);

    env.run_ok(&["stats", "--at", "2025-01-06T09:05:00Z"]);

    let mut backup = env.state_path().into_os_string();
    backup.push(".bak");
    assert!(!Path::new(&backup).exists());
}

#[test]
fn test_rules_check_rejects_unknown_version() {
    let env = Env::new();
    env.write_rules(r#"{"formatVersion": "0.2", "projects": {}, "projectSequence": []}"#);

    let output = env.run(&["rules", "check"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid rule document"), "stderr: {stderr}");
    assert!(stderr.contains("0.2"), "stderr: {stderr}");
}

#[test]
fn test_stats_text_without_activity() {
    let env = Env::new();
    assert_eq!(env.run_ok(&["stats"]), "No activity recorded.\n");
}
