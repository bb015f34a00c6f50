//! Integration tests for the entire `qds-cluster` executable.
//!
//! Anything that would reach the real QDS API lives behind `#[ignore]`; the
//! tests that run by default stay offline.

use cli_test_dir::*;

#[test]
fn help_flag() {
    let testdir = TestDir::new("qds-cluster", "help_flag");
    let output = testdir.cmd().arg("--help").expect_success();
    assert!(output.stdout_str().contains("qds-cluster"));
}

#[test]
fn version_flag() {
    let testdir = TestDir::new("qds-cluster", "version_flag");
    let output = testdir.cmd().arg("--version").expect_success();
    assert!(output.stdout_str().contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn operations_on_existing_clusters_require_an_identifier() {
    let testdir = TestDir::new("qds-cluster", "operations_require_an_identifier");
    let output = testdir
        .cmd()
        .args(&["--api-token", "not-a-real-token", "start"])
        .expect_failure();
    assert!(output.stderr_str().contains("CLUSTER"));
}

#[test]
fn unknown_choice_values_are_rejected() {
    let testdir = TestDir::new("qds-cluster", "unknown_choice_values_are_rejected");
    testdir
        .cmd()
        .args(&[
            "--api-token",
            "not-a-real-token",
            "setup",
            "--slave-request-type",
            "preemptible",
        ])
        .expect_failure();
}

/// Fetches a real cluster descriptor; needs QDS_API_TOKEN and a cluster
/// labeled "qds-cluster-test" in the account.
#[test]
#[ignore]
fn get_reports_changed_false() {
    let testdir = TestDir::new("qds-cluster", "get_reports_changed_false");
    let output = testdir
        .cmd()
        .args(&["get", "qds-cluster-test"])
        .expect_success();
    let outcome: serde_json::Value =
        serde_json::from_str(output.stdout_str().trim()).expect("error parsing output JSON");
    assert_eq!(outcome["changed"], serde_json::Value::Bool(false));
    assert!(outcome.get("cluster").is_some());
}
