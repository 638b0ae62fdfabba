//! Exit-code contract: bad configuration fails fast with code 1 and never
//! reaches the network.

use assert_cmd::Command;
use predicates::prelude::*;

const SERVER: &str = "FX_REMOTE_SETTINGS_WRITER_SERVER";
const USER: &str = "FX_REMOTE_SETTINGS_WRITER_USER";
const PASS: &str = "FX_REMOTE_SETTINGS_WRITER_PASS";

// Port 9 (discard) on localhost: any request that slipped through would fail
// with a transport error rather than the configuration error asserted below.
const UNREACHABLE: &str = "http://127.0.0.1:9/v1";

fn credsync() -> Command {
    let mut cmd = Command::cargo_bin("credsync").expect("credsync binary");
    cmd.env_remove(SERVER)
        .env_remove(USER)
        .env_remove(PASS)
        .env_remove("CREDSYNC_LEGACY_RULES_PATH")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn empty_password_exits_with_code_one() {
    credsync()
        .env(SERVER, UNREACHABLE)
        .env(USER, "writer")
        .env(PASS, "")
        .arg("sync")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(PASS))
        .stderr(predicate::str::contains("is empty"));
}

#[test]
fn missing_user_exits_with_code_one() {
    credsync()
        .env(SERVER, UNREACHABLE)
        .env(PASS, "secret")
        .args(["sync", "--dry-run"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(USER));
}

#[test]
fn missing_server_fails_status_and_diff() {
    for sub in ["status", "diff"] {
        credsync()
            .env(USER, "writer")
            .env(PASS, "secret")
            .arg(sub)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("required environment variable was not set"));
    }
}

#[test]
fn unknown_pass_is_a_usage_error() {
    credsync()
        .args(["sync", "--only", "everything"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown pass"));
}

#[test]
fn help_lists_subcommands() {
    credsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("diff"));
}
