//! End-to-end tests for the mlpanel binary.

use std::collections::HashMap;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use mlpanel_core::models::{ExperimentRunConfig, RunConfig};
use mlpanel_core::store::RunStore;

fn seeded_dataset(tmp: &TempDir) -> std::path::PathBuf {
    let dir = tmp.path().join("quickstart");
    let store = RunStore::open(&dir).unwrap();
    store
        .register_run(
            "exp_a",
            RunConfig::MlflowExperiment(ExperimentRunConfig {
                experiment_name: "exp_a".into(),
                experiment_id: "1".into(),
                tracking_uri: None,
                artifact_location: None,
                created_at: None,
                tags: HashMap::new(),
                runs: vec![],
            }),
        )
        .unwrap();
    dir
}

#[test]
fn test_urls_empty_dataset() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("empty");

    Command::cargo_bin("mlpanel")
        .unwrap()
        .args(["urls", dir.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("No experiment URLs"));
}

#[test]
fn test_runs_lists_linked_experiment() {
    let tmp = TempDir::new().unwrap();
    let dir = seeded_dataset(&tmp);

    Command::cargo_bin("mlpanel")
        .unwrap()
        .args(["runs", dir.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("exp_a")
                .and(predicate::str::contains("mlflow_experiment")),
        );
}

#[test]
fn test_urls_lists_experiment_page() {
    let tmp = TempDir::new().unwrap();
    let dir = seeded_dataset(&tmp);

    Command::cargo_bin("mlpanel")
        .unwrap()
        .args(["urls", dir.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "http://localhost:8080/#/experiments/1",
        ));
}

#[test]
fn test_info_prints_record() {
    let tmp = TempDir::new().unwrap();
    let dir = seeded_dataset(&tmp);

    Command::cargo_bin("mlpanel")
        .unwrap()
        .args(["info", "exp_a", dir.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Run key:    exp_a")
                .and(predicate::str::contains("method: mlflow_experiment")),
        );
}

#[test]
fn test_info_unknown_key_fails() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("quickstart");
    RunStore::open(&dir).unwrap();

    Command::cargo_bin("mlpanel")
        .unwrap()
        .args(["info", "missing", dir.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Run not found"));
}

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("mlpanel")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("serve")
                .and(predicate::str::contains("link"))
                .and(predicate::str::contains("urls")),
        );
}
