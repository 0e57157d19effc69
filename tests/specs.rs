//! Black-box specs for the `rex` CLI surface, run against the compiled
//! binary rather than the library crates directly — mirrors the rest of
//! the test pyramid's per-module unit tests (colocated under each
//! `crates/*/src`) with the end-to-end behavior a user actually invokes.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn rex() -> Command {
    Command::cargo_bin("rex").expect("rex binary builds")
}

const VALID_MANUAL_RULE: &str = r#"
name: greet
enabled: true
trigger:
  type: manual
action:
  prompt: "hello {{name}}"
"#;

fn write(dir: &std::path::Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).expect("write rule document");
}

#[test]
fn validate_accepts_a_well_formed_directory() {
    let dir = tempdir().expect("tempdir");
    write(dir.path(), "greet.yaml", VALID_MANUAL_RULE);

    rex().args(["validate", dir.path().to_str().expect("utf8 path")])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok: greet"))
        .stdout(predicate::str::contains("1 valid, 0 invalid"));
}

#[test]
fn validate_is_resilient_to_mixed_valid_and_invalid_documents() {
    let dir = tempdir().expect("tempdir");
    write(dir.path(), "good.yaml", VALID_MANUAL_RULE);
    write(dir.path(), "bad.yaml", "enabled: true\n");

    rex().args(["validate", dir.path().to_str().expect("utf8 path")])
        .assert()
        .failure()
        .stdout(predicate::str::contains("ok: good"))
        .stdout(predicate::str::contains("invalid:"))
        .stdout(predicate::str::contains("1 valid, 1 invalid"));
}

#[test]
fn validate_rejects_webhook_listen_path_without_leading_slash() {
    let dir = tempdir().expect("tempdir");
    write(
        dir.path(),
        "hook.yaml",
        r#"
name: hook
enabled: true
trigger:
  type: webhook
  listen_path: "no-leading-slash"
action:
  prompt: "got a hook"
"#,
    );

    rex().args(["validate", dir.path().to_str().expect("utf8 path")])
        .assert()
        .failure()
        .stdout(predicate::str::contains("must start with"));
}

#[test]
fn validate_rejects_run_as_user_root() {
    let dir = tempdir().expect("tempdir");
    write(
        dir.path(),
        "asroot.yaml",
        r#"
name: asroot
enabled: true
run_as_user: root
trigger:
  type: manual
action:
  prompt: "nope"
"#,
    );

    rex().args(["validate", dir.path().to_str().expect("utf8 path")])
        .assert()
        .failure()
        .stdout(predicate::str::contains("must not be `root`"));
}

#[test]
fn validate_rejects_bypass_permissions_mode() {
    let dir = tempdir().expect("tempdir");
    write(
        dir.path(),
        "bypass.yaml",
        r#"
name: bypass
enabled: true
trigger:
  type: manual
action:
  prompt: "nope"
agent_config:
  permission_mode: bypassPermissions
"#,
    );

    rex().args(["validate", dir.path().to_str().expect("utf8 path")])
        .assert()
        .failure()
        .stdout(predicate::str::contains("bypassPermissions"));
}

#[test]
fn validate_rejects_max_timeout_seconds_above_3600() {
    let dir = tempdir().expect("tempdir");
    write(
        dir.path(),
        "slow.yaml",
        r#"
name: slow
enabled: true
trigger:
  type: manual
action:
  prompt: "nope"
max_timeout_seconds: 3601
"#,
    );

    rex().args(["validate", dir.path().to_str().expect("utf8 path")])
        .assert()
        .failure()
        .stdout(predicate::str::contains("between 1 and 3600"));
}

#[test]
fn validate_accepts_max_timeout_seconds_boundary_values() {
    for boundary in [1, 3600] {
        let dir = tempdir().expect("tempdir");
        write(
            dir.path(),
            "boundary.yaml",
            &format!(
                r#"
name: boundary
enabled: true
trigger:
  type: manual
action:
  prompt: "nope"
max_timeout_seconds: {boundary}
"#
            ),
        );

        rex().args(["validate", dir.path().to_str().expect("utf8 path")])
            .assert()
            .success();
    }
}

#[test]
fn validate_rejects_scheduled_rule_with_no_expression() {
    let dir = tempdir().expect("tempdir");
    write(
        dir.path(),
        "tick.yaml",
        r#"
name: tick
enabled: true
trigger:
  type: scheduled
action:
  prompt: "tick"
"#,
    );

    rex().args(["validate", dir.path().to_str().expect("utf8 path")])
        .assert()
        .failure()
        .stdout(predicate::str::contains("cron_expression"));
}

#[test]
fn validate_rejects_scheduled_rule_with_ambiguous_expression() {
    let dir = tempdir().expect("tempdir");
    write(
        dir.path(),
        "tick.yaml",
        r#"
name: tick
enabled: true
trigger:
  type: scheduled
  cron_expression: "0 * * * * *"
  run_every: "5m"
action:
  prompt: "tick"
"#,
    );

    rex().args(["validate", dir.path().to_str().expect("utf8 path")])
        .assert()
        .failure()
        .stdout(predicate::str::contains("exactly one of"));
}

#[test]
fn validate_accepts_five_and_six_field_cron_expressions() {
    for expr in ["*/5 * * * *", "0 */5 * * * *"] {
        let dir = tempdir().expect("tempdir");
        write(
            dir.path(),
            "tick.yaml",
            &format!(
                r#"
name: tick
enabled: true
trigger:
  type: scheduled
  cron_expression: "{expr}"
action:
  prompt: "tick"
"#
            ),
        );

        rex().args(["validate", dir.path().to_str().expect("utf8 path")])
            .assert()
            .success();
    }
}

#[test]
fn validate_rejects_filesystem_rule_without_watch_paths() {
    let dir = tempdir().expect("tempdir");
    write(
        dir.path(),
        "watch.yaml",
        r#"
name: watch
enabled: true
trigger:
  type: filesystem
action:
  prompt: "changed"
"#,
    );

    rex().args(["validate", dir.path().to_str().expect("utf8 path")])
        .assert()
        .failure()
        .stdout(predicate::str::contains("watch_paths"));
}

#[cfg(unix)]
#[test]
fn validate_rejects_world_writable_rules_directory() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().expect("tempdir");
    write(dir.path(), "greet.yaml", VALID_MANUAL_RULE);
    std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o777)).expect("chmod");

    rex().args(["validate", dir.path().to_str().expect("utf8 path")]).assert().failure();
}

#[test]
fn fire_rejects_a_data_pair_without_an_equals_sign() {
    let dir = tempdir().expect("tempdir");

    rex().args(["fire", "some-rule", "--data", "not-a-pair", "--data-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("key=value"));
}

#[test]
fn rules_reports_a_clear_error_when_no_daemon_is_listening() {
    let dir = tempdir().expect("tempdir");

    rex().args(["rules", "--data-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("is the daemon running?"));
}

#[test]
fn history_reports_a_clear_error_when_no_daemon_is_listening() {
    let dir = tempdir().expect("tempdir");

    rex().args(["history", "--data-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("is the daemon running?"));
}

#[test]
fn reload_reports_a_clear_error_when_no_daemon_is_listening() {
    let dir = tempdir().expect("tempdir");

    rex().args(["reload", "--data-dir"]).arg(dir.path()).assert().failure().stderr(predicate::str::contains("is the daemon running?"));
}

#[test]
fn run_exits_non_zero_when_the_rules_directory_is_missing() {
    let dir = tempdir().expect("tempdir");

    rex().args(["run", "--data-dir"]).arg(dir.path()).assert().failure();
}

#[test]
fn no_args_prints_usage() {
    rex().assert().failure().stderr(predicate::str::contains("Usage:"));
}

#[test]
fn help_lists_every_subcommand() {
    rex().arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("rules"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("fire"))
        .stdout(predicate::str::contains("reload"));
}
