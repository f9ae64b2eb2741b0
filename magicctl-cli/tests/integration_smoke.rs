//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// magicctl with an empty home so no real config is picked up
fn magicctl(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("magicctl").unwrap();
    cmd.env("HOME", home.path())
        .env_remove("MAGICCTL_ENDPOINT")
        .env_remove("MAGICCTL_TOKEN")
        .env("MAGICCTL_QUIET", "1");
    cmd
}

// === Users Command Tests ===

#[test]
fn test_users_list_help() {
    let home = TempDir::new().unwrap();
    magicctl(&home)
        .args(["users", "list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Only users whose name contains"))
        .stdout(predicate::str::contains("Output format"));
}

#[test]
fn test_users_delete_help() {
    let home = TempDir::new().unwrap();
    magicctl(&home)
        .args(["users", "delete", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skip the confirmation prompt"));
}

#[test]
fn test_users_list_rejects_zero_limit() {
    let home = TempDir::new().unwrap();
    magicctl(&home)
        .args(["users", "list", "--limit", "0"])
        .assert()
        .failure();
}

#[test]
fn test_users_list_unreachable_backend() {
    let home = TempDir::new().unwrap();
    magicctl(&home)
        .args(["--endpoint", "http://127.0.0.1:9", "users", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Network error"));
}

// === Sockets Command Tests ===

#[test]
fn test_sockets_list_help() {
    let home = TempDir::new().unwrap();
    magicctl(&home)
        .args(["sockets", "list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("case-sensitive"));
}

// === Config Command Tests ===

#[test]
fn test_config_path_uses_home() {
    let home = TempDir::new().unwrap();
    magicctl(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".magicctl/config.toml"));
}

#[test]
fn test_config_init_then_show() {
    let home = TempDir::new().unwrap();
    magicctl(&home)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config"));

    assert!(home.path().join(".magicctl/config.toml").exists());

    // A second init refuses to overwrite
    magicctl(&home)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    magicctl(&home)
        .args(["--endpoint", "https://magic.example.com", "--token", "secret"])
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://magic.example.com"))
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("secret").not());
}

// === Completions ===

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    magicctl(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("magicctl"));
}
