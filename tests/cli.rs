mod common;

use assert_cmd::{Command, cargo_bin_cmd};
use predicates::prelude::*;
use std::path::Path;

/// Runs `rollcall` against its own database and session file.
fn rollcall(db: &Path, session: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("rollcall");
    cmd.env("DATABASE_URL", db)
        .env("ROLLCALL_AUTH__SESSION_FILE", session)
        .env("ROLLCALL_AUTH__RETRY_INTERVAL_MS", "0")
        .env_remove("RUST_LOG");
    cmd
}

fn cleanup(paths: &[&Path]) {
    for path in paths {
        std::fs::remove_file(path).ok();
    }
}

#[test]
fn protected_pages_redirect_to_login() {
    let db = common::temp_path("cli-redirect", "sqlite3");
    let session = common::temp_path("cli-redirect", "json");

    rollcall(&db, &session)
        .arg("dashboard")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Not signed in"));

    cleanup(&[&db, &session]);
}

#[test]
fn sign_up_confirm_login_and_create_a_class() {
    let db = common::temp_path("cli-flow", "sqlite3");
    let session = common::temp_path("cli-flow", "json");

    rollcall(&db, &session)
        .args(["sign-up", "ada@x.com", "--password", "hunter22"])
        .assert()
        .success()
        .stdout(predicate::str::contains("confirm your account"));

    rollcall(&db, &session)
        .args(["login", "ada@x.com", "--password", "hunter22"])
        .assert()
        .success()
        .stdout(predicate::str::contains("verify your email address"));

    rollcall(&db, &session)
        .args(["confirm-email", "ada@x.com"])
        .assert()
        .success();

    rollcall(&db, &session)
        .args(["login", "ada@x.com", "--password", "hunter22"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Your Classes")
                .and(predicate::str::contains("No classes yet")),
        );

    rollcall(&db, &session)
        .args(["add-class", "CS101", "Fall"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created \"CS101\" (Fall)."));

    rollcall(&db, &session)
        .args(["login", "ada@x.com", "--password", "hunter22"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Already signed in as ada@x.com")
                .and(predicate::str::contains("CS101")),
        );

    rollcall(&db, &session)
        .args(["add-class", "", "Fall"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed to create class: name must not be empty"));

    rollcall(&db, &session).arg("logout").assert().success();

    rollcall(&db, &session)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in."));

    cleanup(&[&db, &session]);
}

#[test]
fn edited_session_file_is_not_trusted() {
    let db = common::temp_path("cli-forged", "sqlite3");
    let session = common::temp_path("cli-forged", "json");

    rollcall(&db, &session)
        .args(["sign-up", "ada@x.com", "--password", "hunter22"])
        .assert()
        .success();
    rollcall(&db, &session)
        .args(["confirm-email", "ada@x.com"])
        .assert()
        .success();
    rollcall(&db, &session)
        .args(["login", "ada@x.com", "--password", "hunter22"])
        .assert()
        .success();

    let mut cached: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&session).unwrap()).unwrap();
    cached["access_token"] = "never-issued".into();
    std::fs::write(&session, cached.to_string()).unwrap();

    rollcall(&db, &session)
        .arg("dashboard")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Not signed in"));

    cleanup(&[&db, &session]);
}
