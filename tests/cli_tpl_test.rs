//! Integration tests for `lb tpl` commands: template lifecycle,
//! category-exclusive replacement, and preview mode.

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_new_template_defaults() {
    let env = TestEnv::new();
    let tpl = env.lb_json(&["tpl", "new", "--category", "contract"]);
    assert_eq!(tpl["is_template"], true);
    assert_eq!(tpl["category"], "contract");
    assert_eq!(tpl["title"], "Untitled Template");
}

#[test]
fn test_category_conflict_declined_is_a_noop() {
    let env = TestEnv::new();
    let old = env.lb_json(&["tpl", "new", "Old Task", "--category", "task"]);

    // No --replace: the save aborts, nothing changes.
    let outcome = env.lb_json(&["tpl", "new", "New Task", "--category", "task"]);
    assert_eq!(outcome["saved"], false);
    assert_eq!(outcome["conflict"]["title"], "Old Task");

    let list = env.lb_json(&["tpl", "list"]);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], old["id"]);
    assert_eq!(list[0]["title"], "Old Task");
}

#[test]
fn test_category_conflict_replace_swaps_templates() {
    let env = TestEnv::new();
    env.lb()
        .args(["tpl", "new", "Old Task", "--category", "task"])
        .assert()
        .success();

    let new = env.lb_json(&["tpl", "new", "New Task", "--category", "task", "--replace"]);
    assert_eq!(new["title"], "New Task");

    let list = env.lb_json(&["tpl", "list"]);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "New Task");
}

#[test]
fn test_templates_in_different_categories_coexist() {
    let env = TestEnv::new();
    for category in ["task", "contract", "deposit", "daily-note"] {
        env.lb()
            .args(["tpl", "new", "--category", category])
            .assert()
            .success();
    }
    assert_eq!(env.lb_json(&["tpl", "list"]).as_array().unwrap().len(), 4);
}

#[test]
fn test_set_moving_category_respects_exclusivity() {
    let env = TestEnv::new();
    env.lb()
        .args(["tpl", "new", "Tasks", "--category", "task"])
        .assert()
        .success();
    let contract = env.lb_json(&["tpl", "new", "Contracts", "--category", "contract"]);
    let id = contract["id"].as_str().unwrap();

    // Moving into an occupied category without --replace aborts.
    let outcome = env.lb_json(&["tpl", "set", id, "--category", "task"]);
    assert_eq!(outcome["saved"], false);
    let list = env.lb_json(&["tpl", "list"]);
    assert_eq!(list.as_array().unwrap().len(), 2);

    // With --replace the old holder goes away.
    let moved = env.lb_json(&["tpl", "set", id, "--category", "task", "--replace"]);
    assert_eq!(moved["category"], "task");
    let list = env.lb_json(&["tpl", "list"]);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "Contracts");
}

#[test]
fn test_preview_does_not_persist() {
    let env = TestEnv::new();
    let tpl = env.lb_json(&[
        "tpl", "new", "Contract Form", "--category", "contract",
        "--add-item", "sign",
    ]);
    let id = tpl["id"].as_str().unwrap();

    let preview = env.lb_json(&["tpl", "preview", id]);
    assert_eq!(preview["saved"], false);
    assert_eq!(preview["title"], "Contract Form");
    assert_ne!(preview["id"], tpl["id"]);

    assert!(env.lb_json(&["doc", "list"]).as_array().unwrap().is_empty());
}

#[test]
fn test_preview_save_creates_copy_titled_document() {
    let env = TestEnv::new();
    let tpl = env.lb_json(&[
        "tpl", "new", "Contract Form", "--category", "contract",
        "--add-item", "sign", "--add-item", "date",
    ]);
    let id = tpl["id"].as_str().unwrap();

    let doc = env.lb_json(&["tpl", "preview", id, "--save", "--title", ""]);
    assert_eq!(doc["is_template"], false);
    assert_eq!(doc["kind"], "contract");
    assert_eq!(doc["title"], "Contract Form (copy)");
    assert_eq!(doc["checklist"]["total"], 2);
    assert_eq!(doc["checklist"]["checked"], 0);

    // The source template is untouched.
    let list = env.lb_json(&["tpl", "list"]);
    assert_eq!(list.as_array().unwrap()[0]["title"], "Contract Form");
    assert_eq!(env.lb_json(&["doc", "list"]).as_array().unwrap().len(), 1);
}

#[test]
fn test_preview_unknown_template_fails() {
    let env = TestEnv::new();
    env.lb()
        .args(["tpl", "preview", "no-such-id"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_delete_template() {
    let env = TestEnv::new();
    let tpl = env.lb_json(&["tpl", "new", "Doomed", "--category", "deposit"]);
    let id = tpl["id"].as_str().unwrap();

    env.lb().args(["tpl", "delete", id, "-y"]).assert().success();
    assert!(env.lb_json(&["tpl", "list"]).as_array().unwrap().is_empty());
}
