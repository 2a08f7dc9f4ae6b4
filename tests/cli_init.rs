//! Workspace scaffolding.

mod common;

use common::{stderr, stdout, TestWorkspace};

#[test]
fn test_init_then_check_passes() {
    let ws = TestWorkspace::new();

    let init = ws.convoy(&["init"]);
    assert!(init.status.success(), "init failed: {}", stdout(&init));
    assert!(ws.exists("convoy.yml"));

    let check = ws.convoy(&["check"]);
    assert!(check.status.success(), "check failed: {}", stdout(&check));
}

#[test]
fn test_init_refuses_overwrite_without_force() {
    let ws = TestWorkspace::new();
    ws.write("convoy.yml", "name: existing\n");

    let output = ws.convoy(&["init"]);
    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("already exists"),
        "got:\n{}",
        stderr(&output)
    );
    assert_eq!(ws.read("convoy.yml"), "name: existing\n");
}

#[test]
fn test_plan_without_config_fails_clearly() {
    let ws = TestWorkspace::new();

    let output = ws.convoy(&["plan"]);
    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("config file not found"),
        "got:\n{}",
        stderr(&output)
    );
}
