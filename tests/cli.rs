use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn planctl() -> Command {
    let mut cmd = Command::cargo_bin("planctl").unwrap();
    cmd.env_remove("PLANCTL_TOKEN")
        .env_remove("PLANCTL_API_URL")
        .env_remove("PLANCTL_PASSWORD");
    cmd
}

fn write_config(dir: &Path, base_url: &str) -> std::path::PathBuf {
    let path = dir.join("planctl.yaml");
    let yaml = format!(
        "api:\n  base_url: {}\nsession_file: {}\ntui:\n  log_file: {}\n",
        base_url,
        dir.join("session.json").display(),
        dir.join("logs/planctl.log").display()
    );
    fs::write(&path, yaml).unwrap();
    path
}

#[test]
fn help_lists_commands() {
    planctl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("nodes"))
        .stdout(predicate::str::contains("scenarios"))
        .stdout(predicate::str::contains("services"))
        .stdout(predicate::str::contains("tui"));
}

#[test]
fn schema_describes_config() {
    planctl()
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("base_url"))
        .stdout(predicate::str::contains("refresh_ms"));
}

#[test]
fn bad_base_url_is_rejected_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "ftp://plan.example.com");

    planctl()
        .args(["--config", config.to_str().unwrap(), "scenarios", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid API base URL"));
}

#[test]
fn logout_without_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:9");

    planctl()
        .args(["--config", config.to_str().unwrap(), "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in"));
}

#[test]
fn logout_removes_saved_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:9");
    fs::write(
        dir.path().join("session.json"),
        r#"{"access_token":"t0k3n","token_type":"bearer","email":"ada@example.com","logged_in_at":"2025-04-01T09:00:00Z"}"#,
    )
    .unwrap();

    planctl()
        .args(["--config", config.to_str().unwrap(), "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out"));
    assert!(!dir.path().join("session.json").exists());
}

#[test]
fn tui_requires_a_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:9");

    planctl()
        .args(["--config", config.to_str().unwrap(), "tui"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));
    assert!(dir.path().join("logs/planctl.log").exists());
}
