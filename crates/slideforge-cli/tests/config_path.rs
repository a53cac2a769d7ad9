use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_config_path_command() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("slideforge")
        .env("SLIDEFORGE_HOME", dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            dir.path().join("config.toml").display().to_string(),
        ));
}

#[test]
fn test_config_init_creates_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    cargo_bin_cmd!("slideforge")
        .env("SLIDEFORGE_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config at"));

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("timeout_secs = 300"));
    assert!(contents.contains("# base_url ="));
}

#[test]
fn test_config_init_fails_if_exists() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "# existing config").unwrap();

    cargo_bin_cmd!("slideforge")
        .env("SLIDEFORGE_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_config_generate_prints_defaults() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("slideforge")
        .env("SLIDEFORGE_HOME", dir.path())
        .args(["config", "generate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("conversation_policy = \"first_wins\""));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "timeout_secs = \"soon\"").unwrap();

    cargo_bin_cmd!("slideforge")
        .env("SLIDEFORGE_HOME", dir.path())
        .args(["config", "path"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("slideforge")
        .env("SLIDEFORGE_HOME", dir.path())
        .env_remove("SLIDEFORGE_BASE_URL")
        .args(["--base-url", "not a url", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid SlideForge base URL"));
}
