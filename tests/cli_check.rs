//! Static workspace validation.

mod common;

use common::{stdout, TestWorkspace};

#[test]
fn test_check_passes_on_valid_workspace() {
    let ws = TestWorkspace::with_basic_workspace();

    let output = ws.convoy(&["check"]);
    assert!(output.status.success(), "check failed: {}", stdout(&output));
    assert!(stdout(&output).contains("no errors"));
}

#[test]
fn test_check_reports_unknown_target_and_dependency() {
    let ws = TestWorkspace::new();
    ws.write("convoy.yml", "name: testws\n");
    ws.write(
        "a/convoy.artifact.yml",
        "name: a\ntarget: mainframe\ndepends_on: [ghost]\n",
    );

    let output = ws.convoy(&["check"]);
    assert!(!output.status.success());

    let text = stdout(&output);
    assert!(text.contains("unknown target 'mainframe'"), "got:\n{text}");
    assert!(
        text.contains("depends on unknown artifact 'ghost'"),
        "got:\n{text}"
    );
}

#[test]
fn test_check_reports_dependency_cycles() {
    let ws = TestWorkspace::new();
    ws.write("convoy.yml", "name: testws\n");
    ws.write("a/convoy.lib.yml", "name: a\ndepends_on: [b]\n");
    ws.write("b/convoy.lib.yml", "name: b\ndepends_on: [a]\n");

    let output = ws.convoy(&["check"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("dependency cycle"), "got:\n{}", stdout(&output));
}

#[test]
fn test_check_warns_on_unknown_language() {
    let ws = TestWorkspace::new();
    ws.write("convoy.yml", common::BASIC_CONFIG);
    // No build.sh, so the shell language does not match
    ws.write("a/convoy.artifact.yml", "name: a\ntarget: echo\n");

    let output = ws.convoy(&["check"]);
    assert!(output.status.success());
    assert!(
        stdout(&output).contains("no detectable language"),
        "got:\n{}",
        stdout(&output)
    );
}

#[test]
fn test_check_json_output() {
    let ws = TestWorkspace::with_basic_workspace();

    let output = ws.convoy(&["check", "--json"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["artifacts"], 2);
    assert!(report["errors"].as_array().unwrap().is_empty());
}

#[test]
fn test_duplicate_artifact_names_abort() {
    let ws = TestWorkspace::new();
    ws.write("convoy.yml", "name: testws\n");
    ws.write("a/convoy.artifact.yml", "name: api\n");
    ws.write("b/convoy.artifact.yml", "name: api\n");

    let output = ws.convoy(&["check"]);
    assert!(!output.status.success());
    assert!(
        common::stderr(&output).contains("duplicate artifact name 'api'"),
        "got:\n{}",
        common::stderr(&output)
    );
}
