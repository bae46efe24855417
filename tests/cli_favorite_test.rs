//! Integration tests for the favorite document pointer.

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_set_and_show_favorite() {
    let env = TestEnv::new();
    let doc = env.lb_json(&["doc", "new", "Pinned"]);
    let id = doc["id"].as_str().unwrap();

    env.lb().args(["favorite", "set", id]).assert().success();
    let favorite = env.lb_json(&["favorite", "show"]);
    assert_eq!(favorite["id"], doc["id"]);
    assert_eq!(favorite["title"], "Pinned");
}

#[test]
fn test_set_favorite_requires_existing_document() {
    let env = TestEnv::new();
    env.lb()
        .args(["favorite", "set", "no-such-id"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_clear_favorite() {
    let env = TestEnv::new();
    let doc = env.lb_json(&["doc", "new", "Pinned"]);
    env.lb()
        .args(["favorite", "set", doc["id"].as_str().unwrap()])
        .assert()
        .success();

    env.lb().args(["favorite", "clear"]).assert().success();
    let favorite = env.lb_json(&["favorite", "show"]);
    assert_eq!(favorite["favorite"], serde_json::Value::Null);
}

#[test]
fn test_deleting_favorite_clears_pointer() {
    let env = TestEnv::new();
    let doc = env.lb_json(&["doc", "new", "Pinned"]);
    let id = doc["id"].as_str().unwrap();
    env.lb().args(["favorite", "set", id]).assert().success();

    env.lb().args(["doc", "delete", id, "-y"]).assert().success();
    let favorite = env.lb_json(&["favorite", "show"]);
    assert_eq!(favorite["favorite"], serde_json::Value::Null);
}

#[test]
fn test_deleting_other_document_keeps_pointer() {
    let env = TestEnv::new();
    let pinned = env.lb_json(&["doc", "new", "Pinned"]);
    let other = env.lb_json(&["doc", "new", "Other"]);
    env.lb()
        .args(["favorite", "set", pinned["id"].as_str().unwrap()])
        .assert()
        .success();

    env.lb()
        .args(["doc", "delete", other["id"].as_str().unwrap(), "-y"])
        .assert()
        .success();
    let favorite = env.lb_json(&["favorite", "show"]);
    assert_eq!(favorite["id"], pinned["id"]);
}
