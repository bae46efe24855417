//! Integration tests for backup export and restore.

mod common;

use common::TestEnv;
use predicates::prelude::*;
use std::fs;

#[test]
fn test_export_writes_backup_file() {
    let env = TestEnv::new();
    env.lb()
        .args(["doc", "new", "Keep", "--content", "body"])
        .assert()
        .success();
    env.lb()
        .args(["tpl", "new", "Seed", "--category", "task"])
        .assert()
        .success();

    let result = env.lb_json(&["backup", "export", "backup.json"]);
    assert_eq!(result["documents"], 1);
    assert_eq!(result["templates"], 1);

    let raw = fs::read_to_string(env.work_path().join("backup.json")).unwrap();
    let backup: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(backup["version"], "1.0");
    assert!(backup["exportDate"].as_str().is_some());
    assert_eq!(backup["documents"].as_array().unwrap().len(), 1);
    assert_eq!(backup["templates"].as_array().unwrap().len(), 1);
}

#[test]
fn test_round_trip_into_fresh_installation() {
    let env = TestEnv::new();
    let doc = env.lb_json(&[
        "doc", "new", "Move out", "--kind", "contract",
    ]);
    env.lb()
        .args(["doc", "set", doc["id"].as_str().unwrap(), "--add-item", "keys"])
        .assert()
        .success();
    env.lb()
        .args(["backup", "export", "backup.json"])
        .assert()
        .success();

    // Restore into a brand-new data dir.
    let fresh = TestEnv::new();
    let backup_path = env.work_path().join("backup.json");
    let result = fresh.lb_json(&["backup", "import", backup_path.to_str().unwrap()]);
    assert_eq!(result["restored"], true);
    assert_eq!(result["documents"], 1);

    let list = fresh.lb_json(&["doc", "list"]);
    let restored = &list.as_array().unwrap()[0];
    assert_eq!(restored["id"], doc["id"]);
    assert_eq!(restored["title"], "Move out");
    assert_eq!(restored["kind"], "contract");
    assert_eq!(restored["checklist"]["total"], 1);
}

#[test]
fn test_import_rejects_missing_version() {
    let env = TestEnv::new();
    env.lb().args(["doc", "new", "Existing"]).assert().success();

    let bad = env.work_path().join("bad.json");
    fs::write(&bad, r#"{"documents": [], "templates": []}"#).unwrap();

    env.lb()
        .args(["backup", "import", bad.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid backup file format"));

    // Nothing was applied.
    let list = env.lb_json(&["doc", "list"]);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list.as_array().unwrap()[0]["title"], "Existing");
}

#[test]
fn test_import_rejects_non_array_collections() {
    let env = TestEnv::new();
    let bad = env.work_path().join("bad.json");
    fs::write(
        &bad,
        r#"{"version": "1.0", "exportDate": "x", "documents": "oops", "templates": []}"#,
    )
    .unwrap();

    env.lb()
        .args(["backup", "import", bad.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid backup file format"));
}

#[test]
fn test_import_unreadable_file_reports_message() {
    let env = TestEnv::new();
    env.lb()
        .args(["backup", "import", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn test_import_accepts_legacy_app_backup() {
    // A backup written by the original web app: camelCase fields, epoch
    // milliseconds, boolean kind flags.
    let env = TestEnv::new();
    let legacy = env.work_path().join("legacy.json");
    fs::write(
        &legacy,
        r#"{
            "version": "1.0",
            "exportDate": "2024-11-02T09:00:00.000Z",
            "documents": [{
                "id": "lxk3f9a2",
                "title": "Lease",
                "content": "",
                "checklist": [{"id": "i1", "text": "deposit", "isChecked": true}],
                "updatedAt": 1700000000000,
                "isTemplate": false,
                "isContract": true
            }],
            "templates": [{
                "id": "lxk3f9a9",
                "title": "Old Template",
                "content": "",
                "checklist": [],
                "updatedAt": 1700000000000,
                "isTemplate": true
            }]
        }"#,
    )
    .unwrap();

    let result = env.lb_json(&["backup", "import", legacy.to_str().unwrap()]);
    assert_eq!(result["restored"], true);

    let docs = env.lb_json(&["doc", "list"]);
    assert_eq!(docs.as_array().unwrap()[0]["kind"], "contract");

    // A template without a category defaults to seeding tasks.
    let tpls = env.lb_json(&["tpl", "list"]);
    assert_eq!(tpls.as_array().unwrap()[0]["category"], "task");
}
