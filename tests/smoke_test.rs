//! Smoke tests: the binary exists, parses arguments, and works on a fresh
//! installation without any setup step.

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_help_runs() {
    let env = TestEnv::new();
    env.lb()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("document and checklist manager"));
}

#[test]
fn test_fresh_installation_lists_empty() {
    let env = TestEnv::new();
    let docs = env.lb_json(&["doc", "list"]);
    assert!(docs.as_array().unwrap().is_empty());
    let tpls = env.lb_json(&["tpl", "list"]);
    assert!(tpls.as_array().unwrap().is_empty());
}

#[test]
fn test_unknown_subcommand_fails() {
    let env = TestEnv::new();
    env.lb().arg("frobnicate").assert().failure();
}

#[test]
fn test_data_survives_between_invocations() {
    let env = TestEnv::new();
    env.lb().args(["doc", "new", "Persistent"]).assert().success();
    let list = env.lb_json(&["doc", "list"]);
    assert_eq!(list.as_array().unwrap()[0]["title"], "Persistent");
}
