//! Integration tests for the taskboard CLI
//!
//! Commands run against an in-process mock backend with the session file
//! and config isolated in a temp directory.

mod common;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use common::{MockBackend, PASSWORD};
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

/// Helper to create a taskboard Command isolated in `dir`
fn taskboard(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("taskboard");
    cmd.current_dir(dir.path())
        .env("TASKBOARD_SESSION_FILE", dir.path().join("session.json"))
        .env_remove("TASKBOARD_API_URL")
        .env_remove("TASKBOARD_TIMEOUT_SECS")
        .env_remove("TASKBOARD_LOG_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn login(dir: &TempDir, backend: &MockBackend) {
    taskboard(dir)
        .args(["--api-url", &backend.url, "login", "--email", "alice@example.com"])
        .args(["--password", PASSWORD])
        .assert()
        .success();
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_taskboard_help() {
        let dir = TempDir::new().unwrap();
        taskboard(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("create-project"));
    }

    #[test]
    fn test_taskboard_version() {
        let dir = TempDir::new().unwrap();
        taskboard(&dir).arg("--version").assert().success();
    }

    #[test]
    fn test_whoami_without_session() {
        let dir = TempDir::new().unwrap();
        taskboard(&dir)
            .arg("whoami")
            .assert()
            .success()
            .stdout(predicate::str::contains("Not logged in"));
    }

    #[test]
    fn test_projects_without_session_fails() {
        let dir = TempDir::new().unwrap();
        taskboard(&dir)
            .arg("projects")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not logged in"));
    }

    #[test]
    fn test_logout_without_session_is_fine() {
        let dir = TempDir::new().unwrap();
        taskboard(&dir)
            .arg("logout")
            .assert()
            .success()
            .stdout(predicate::str::contains("Logged out"));
    }
}

// =============================================================================
// Configuration Tests
// =============================================================================

mod configuration {
    use super::*;

    #[test]
    fn test_config_show_defaults() {
        let dir = TempDir::new().unwrap();
        taskboard(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No config file"))
            .stdout(predicate::str::contains("http://localhost:5000"));
    }

    #[test]
    fn test_config_show_layers_file_and_env() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".taskboard")).unwrap();
        fs::write(
            dir.path().join(".taskboard/taskboard.toml"),
            "[api]\nbase_url = \"https://file.example.com\"\ntimeout_secs = 9\n",
        )
        .unwrap();

        taskboard(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("https://file.example.com"))
            .stdout(predicate::str::contains("timeout_secs = 9"));

        taskboard(&dir)
            .env("TASKBOARD_API_URL", "https://env.example.com")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("https://env.example.com"));
    }

    #[test]
    fn test_invalid_config_file_fails() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".taskboard")).unwrap();
        fs::write(dir.path().join(".taskboard/taskboard.toml"), "[api\n").unwrap();

        taskboard(&dir)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to load configuration"));
    }

    #[test]
    fn test_config_path() {
        let dir = TempDir::new().unwrap();
        taskboard(&dir)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains(".taskboard"));
    }
}

// =============================================================================
// Backend Round-trip Tests
// =============================================================================

mod backend {
    use super::*;

    #[test]
    fn test_login_then_whoami_and_logout() {
        let backend = MockBackend::start();
        let dir = TempDir::new().unwrap();
        login(&dir, &backend);
        assert!(dir.path().join("session.json").exists());

        taskboard(&dir)
            .args(["--api-url", &backend.url, "whoami"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Alice"));

        taskboard(&dir).arg("logout").assert().success();
        assert!(!dir.path().join("session.json").exists());
    }

    #[test]
    fn test_bad_password_reports_server_message() {
        let backend = MockBackend::start();
        let dir = TempDir::new().unwrap();
        taskboard(&dir)
            .args(["--api-url", &backend.url, "login", "--email", "alice@example.com"])
            .args(["--password", "wrong"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid email or password"));
    }

    #[test]
    fn test_password_from_stdin() {
        let backend = MockBackend::start();
        let dir = TempDir::new().unwrap();
        taskboard(&dir)
            .args(["--api-url", &backend.url, "login", "--email", "alice@example.com"])
            .write_stdin(format!("{}\n", PASSWORD))
            .assert()
            .success()
            .stdout(predicate::str::contains("Logged in as"));
    }

    #[test]
    fn test_users_hides_suspended_unless_all() {
        let backend = MockBackend::start();
        let dir = TempDir::new().unwrap();
        login(&dir, &backend);

        taskboard(&dir)
            .args(["--api-url", &backend.url, "users"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Alice"))
            .stdout(predicate::str::contains("Bob").not());

        taskboard(&dir)
            .args(["--api-url", &backend.url, "users", "--all"])
            .assert()
            .success()
            .stdout(predicate::str::contains("suspended"));
    }

    #[test]
    fn test_create_project_then_list_and_board() {
        let backend = MockBackend::start();
        let dir = TempDir::new().unwrap();
        login(&dir, &backend);

        taskboard(&dir)
            .args(["--api-url", &backend.url, "create-project", "Website"])
            .args(["--description", "Relaunch"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created project"));

        taskboard(&dir)
            .args(["--api-url", &backend.url, "projects"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Website"))
            .stdout(predicate::str::contains("1 members"));

        backend.seed_project(json!({
            "id": 42,
            "name": "Launch",
            "tasks": [
                {"id": 1, "title": "Fix bug", "status": "todo", "priority": "high"},
                {"id": 2, "title": "Write notes", "status": "done"}
            ]
        }));
        taskboard(&dir)
            .args(["--api-url", &backend.url, "board", "42"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Launch"))
            .stdout(predicate::str::contains("In Progress"))
            .stdout(predicate::str::contains("Fix bug"));

        taskboard(&dir)
            .args(["--api-url", &backend.url, "stats", "42"])
            .assert()
            .success()
            .stdout(predicate::str::contains("50% complete"));
    }

    #[test]
    fn test_board_unknown_project_fails() {
        let backend = MockBackend::start();
        let dir = TempDir::new().unwrap();
        login(&dir, &backend);
        taskboard(&dir)
            .args(["--api-url", &backend.url, "board", "999"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Project 999 not found"));
    }
}
