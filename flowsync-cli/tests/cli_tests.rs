//! Binary-level checks that need neither a network nor a pulled mirror.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

/// Nothing listens on the discard port, so any remote call fails fast.
const DEAD_REMOTE: &str = "http://127.0.0.1:9";

fn flowsync_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("flowsync"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("FLOWSYNC_AGENT_DIR")
        .env_remove("FLOWSYNC_PROJECT_ID")
        .env_remove("FLOWSYNC_BASE_URL")
        .env_remove("FLOWSYNC_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

/// A command configured purely through the environment.
fn configured_cmd(home: &TempDir) -> Command {
    let mut cmd = flowsync_cmd(home.path());
    cmd.env("FLOWSYNC_AGENT_DIR", home.path().join("agent"))
        .env("FLOWSYNC_PROJECT_ID", "proj-1")
        .env("FLOWSYNC_BASE_URL", DEAD_REMOTE);
    cmd
}

#[test]
fn unsupported_diff_mode_lists_modes_and_exits_zero() {
    let home = TempDir::new().expect("home");

    flowsync_cmd(home.path())
        .args(["diff", "flow", "Greeting", "--mode", "tree"])
        .assert()
        .success()
        .stdout(contains("Selected mode 'tree' not supported"))
        .stdout(contains("- full"))
        .stdout(contains("- node"));

    assert!(!home.path().join("agent").exists());
}

#[test]
fn missing_settings_are_reported() {
    let home = TempDir::new().expect("home");

    flowsync_cmd(home.path())
        .args(["pull", "flows"])
        .assert()
        .failure()
        .stderr(contains("failed to load settings"));
}

#[test]
fn diff_without_locale_cache_hints_at_pull_locales() {
    let home = TempDir::new().expect("home");

    configured_cmd(&home)
        .args(["diff", "flow", "Greeting"])
        .assert()
        .failure()
        .stderr(contains("diff failed for 'Greeting'"))
        .stderr(contains("pull locales"));
}

#[test]
fn diff_of_unpulled_flow_names_missing_state() {
    let home = TempDir::new().expect("home");
    let flows = home.path().join("agent").join("flows");
    fs::create_dir_all(&flows).expect("flows dir");
    fs::write(flows.join("locales.json"), r#"[{"_id": "loc-en", "name": "en-US"}]"#)
        .expect("locales");

    configured_cmd(&home)
        .args(["diff", "flow", "Greeting", "--mode", "node"])
        .assert()
        .failure()
        .stderr(contains("no valid local state"));
}

#[test]
fn agent_dir_flag_overrides_settings() {
    let home = TempDir::new().expect("home");
    let other = TempDir::new().expect("other agent dir");
    let flows = other.path().join("flows");
    fs::create_dir_all(&flows).expect("flows dir");
    fs::write(flows.join("locales.json"), r#"[{"_id": "loc-en", "name": "en-US"}]"#)
        .expect("locales");

    // The configured agent dir has no locale cache at all, so getting past
    // that check proves the flag's dir was used.
    configured_cmd(&home)
        .arg("--agent-dir")
        .arg(other.path())
        .args(["diff", "flow", "Greeting"])
        .assert()
        .failure()
        .stderr(contains("no valid local state"))
        .stderr(contains("pull locales").not());
}

#[test]
fn push_with_empty_mirror_does_nothing() {
    let home = TempDir::new().expect("home");

    configured_cmd(&home)
        .args(["push", "flows"])
        .assert()
        .success()
        .stdout(contains("No flows in the local mirror"));
}

#[test]
fn push_of_unpulled_flow_fails_and_names_it() {
    let home = TempDir::new().expect("home");

    configured_cmd(&home)
        .args(["push", "flow", "Missing"])
        .assert()
        .failure()
        .stdout(contains("Missing"))
        .stderr(contains("flow 'Missing' has no valid local state"));
}

#[test]
fn train_of_unpulled_flow_fails_before_contacting_remote() {
    let home = TempDir::new().expect("home");

    configured_cmd(&home)
        .args(["train", "flow", "Greeting", "--timeout", "100"])
        .assert()
        .failure()
        .stderr(contains("no valid local state"))
        .stderr(contains("connection failed").not());
}

#[test]
fn pull_against_unreachable_remote_fails_cleanly() {
    let home = TempDir::new().expect("home");

    configured_cmd(&home)
        .args(["pull", "flow", "Greeting"])
        .assert()
        .failure()
        .stderr(contains("pull failed for 'Greeting'"))
        .stderr(contains("connection failed"));
}

#[test]
fn settings_file_is_used_when_present() {
    let home = TempDir::new().expect("home");
    let agent = home.path().join("from-file");
    let config_dir = home.path().join(".flowsync");
    fs::create_dir_all(&config_dir).expect("config dir");
    fs::write(
        config_dir.join("config.yaml"),
        format!(
            "agent_dir: {}\nproject_id: proj-1\nbase_url: {DEAD_REMOTE}\n",
            agent.display()
        ),
    )
    .expect("config");

    flowsync_cmd(home.path())
        .args(["push", "flows"])
        .assert()
        .success()
        .stdout(contains("No flows in the local mirror"));
}
