//! Integration tests for the run registry and linking flow.

use std::collections::HashMap;

use mlpanel_core::error::MlpanelError;
use mlpanel_core::link;
use mlpanel_core::mlflow::{Experiment, Metric, Run, RunData, RunInfo, Tag};
use mlpanel_core::models::{ExperimentRunConfig, MlflowRunConfig, RunConfig};
use mlpanel_core::store::RunStore;
use tempfile::TempDir;

fn make_store(tmp: &TempDir) -> RunStore {
    RunStore::open(tmp.path().join("quickstart")).expect("Failed to open RunStore")
}

fn experiment_config(name: &str, id: &str, uri: Option<&str>) -> RunConfig {
    RunConfig::MlflowExperiment(ExperimentRunConfig {
        experiment_name: name.to_string(),
        experiment_id: id.to_string(),
        tracking_uri: uri.map(String::from),
        artifact_location: Some(format!("mlflow-artifacts:/{id}")),
        created_at: Some(1700000000000),
        tags: HashMap::new(),
        runs: vec![],
    })
}

fn tracked_experiment(name: &str, id: &str) -> Experiment {
    Experiment {
        experiment_id: id.to_string(),
        name: name.to_string(),
        artifact_location: Some(format!("mlflow-artifacts:/{id}")),
        lifecycle_stage: Some("active".to_string()),
        creation_time: Some(1700000000000),
        last_update_time: Some(1700000500000),
        tags: vec![Tag {
            key: "team".to_string(),
            value: "vision".to_string(),
        }],
    }
}

fn tracked_run(run_id: &str, experiment_id: &str, run_name: &str) -> Run {
    Run {
        info: RunInfo {
            run_id: run_id.to_string(),
            run_uuid: Some(run_id.to_string()),
            experiment_id: experiment_id.to_string(),
            status: Some("FINISHED".to_string()),
            artifact_uri: Some(format!("mlflow-artifacts:/{experiment_id}/{run_id}/artifacts")),
        },
        data: RunData {
            metrics: vec![Metric {
                key: "loss".to_string(),
                value: 0.12,
                timestamp: 1700000100000,
                step: 10,
            }],
            params: vec![],
            tags: vec![Tag {
                key: "mlflow.runName".to_string(),
                value: run_name.to_string(),
            }],
        },
    }
}

#[test]
fn test_register_and_list_runs() {
    let tmp = TempDir::new().unwrap();
    let store = make_store(&tmp);

    store
        .register_run("exp-b", experiment_config("exp-b", "2", None))
        .unwrap();
    store
        .register_run("exp-a", experiment_config("exp-a", "1", None))
        .unwrap();

    let keys = store.list_runs().unwrap();
    assert_eq!(keys, vec!["exp-a", "exp-b"], "keys should be sorted");
    assert!(store.has_run("exp-a"));
    assert!(!store.has_run("exp-c"));
}

#[test]
fn test_register_twice_fails() {
    let tmp = TempDir::new().unwrap();
    let store = make_store(&tmp);

    store
        .register_run("exp-a", experiment_config("exp-a", "1", None))
        .unwrap();
    let err = store
        .register_run("exp-a", experiment_config("exp-a", "1", None))
        .unwrap_err();
    assert!(matches!(err, MlpanelError::RunExists(_)));
}

#[test]
fn test_get_run_info_missing() {
    let tmp = TempDir::new().unwrap();
    let store = make_store(&tmp);

    let err = store.get_run_info("nope").unwrap_err();
    assert!(matches!(err, MlpanelError::RunNotFound(_)));
}

#[test]
fn test_run_record_round_trip() {
    let tmp = TempDir::new().unwrap();
    let store = make_store(&tmp);

    store
        .register_run(
            "exp-a",
            experiment_config("exp-a", "1", Some("http://tracking:5000")),
        )
        .unwrap();

    let record = store.get_run_info("exp-a").unwrap();
    assert_eq!(record.key, "exp-a");
    assert_eq!(record.version, env!("CARGO_PKG_VERSION"));
    let cfg = record.config.as_experiment().expect("experiment config");
    assert_eq!(cfg.experiment_id, "1");
    assert_eq!(cfg.tracking_uri.as_deref(), Some("http://tracking:5000"));
}

#[test]
fn test_update_run_config() {
    let tmp = TempDir::new().unwrap();
    let store = make_store(&tmp);

    store
        .register_run("exp-a", experiment_config("exp-a", "1", None))
        .unwrap();
    let mut record = store.get_run_info("exp-a").unwrap();
    if let RunConfig::MlflowExperiment(cfg) = &mut record.config {
        cfg.runs.push("bold-owl-42".to_string());
    }
    store.update_run_config("exp-a", record.config).unwrap();

    let updated = store.get_run_info("exp-a").unwrap();
    let cfg = updated.config.as_experiment().unwrap();
    assert_eq!(cfg.runs, vec!["bold-owl-42"]);
    assert_eq!(
        updated.timestamp, record.timestamp,
        "update should keep the registration timestamp"
    );
}

#[test]
fn test_candidate_urls_use_default_uri() {
    let tmp = TempDir::new().unwrap();
    let store = make_store(&tmp);

    store
        .register_run("exp-a", experiment_config("exp-a", "1", None))
        .unwrap();
    store
        .register_run(
            "exp-b",
            experiment_config("exp-b", "2", Some("http://tracking:5000")),
        )
        .unwrap();

    let urls = store.candidate_experiment_urls().unwrap();
    assert_eq!(urls.len(), 2);
    assert_eq!(urls[0].name, "exp-a");
    assert_eq!(urls[0].url, "http://localhost:8080/#/experiments/1");
    assert_eq!(urls[1].url, "http://tracking:5000/#/experiments/2");
}

#[test]
fn test_candidate_urls_skip_run_records_and_garbage() {
    let tmp = TempDir::new().unwrap();
    let store = make_store(&tmp);

    store
        .register_run("exp-a", experiment_config("exp-a", "1", None))
        .unwrap();
    store
        .register_run(
            "bold_owl_42",
            RunConfig::MlflowRun(MlflowRunConfig {
                run_name: "bold-owl-42".to_string(),
                run_id: "abc123".to_string(),
                run_uuid: None,
                experiment_id: "1".to_string(),
                artifact_uri: None,
                metrics: HashMap::new(),
                tags: HashMap::new(),
            }),
        )
        .unwrap();
    // A corrupt record should be skipped, not fail the scan
    std::fs::write(
        store.dataset_dir().join("runs").join("broken.yaml"),
        "not: [valid",
    )
    .unwrap();

    let urls = store.candidate_experiment_urls().unwrap();
    assert_eq!(urls.len(), 1, "only the experiment record should qualify");
    assert_eq!(urls[0].name, "exp-a");
}

#[test]
fn test_link_experiment_then_run() {
    let tmp = TempDir::new().unwrap();
    let store = make_store(&tmp);

    let experiment = tracked_experiment("exp-a", "1");
    link::register_experiment(&store, &experiment, "http://tracking:5000").unwrap();

    let run = tracked_run("abc123", "1", "bold-owl-42");
    link::register_run(&store, "exp-a", &run).unwrap();

    // Run key uses the formatted run name
    assert!(store.has_run("bold_owl_42"));
    let run_record = store.get_run_info("bold_owl_42").unwrap();
    match run_record.config {
        RunConfig::MlflowRun(cfg) => {
            assert_eq!(cfg.run_name, "bold-owl-42");
            assert_eq!(cfg.run_id, "abc123");
            assert_eq!(cfg.metrics["loss"], 0.12);
        }
        other => panic!("expected mlflow_run config, got {}", other.method()),
    }

    // Experiment record picks up the run name
    let exp_record = store.get_run_info("exp-a").unwrap();
    let cfg = exp_record.config.as_experiment().unwrap();
    assert_eq!(cfg.runs, vec!["bold-owl-42"]);
    assert_eq!(cfg.tags["team"], "vision");
}

#[test]
fn test_link_same_run_twice_fails() {
    let tmp = TempDir::new().unwrap();
    let store = make_store(&tmp);

    link::register_experiment(&store, &tracked_experiment("exp-a", "1"), "http://tracking:5000")
        .unwrap();
    let run = tracked_run("abc123", "1", "bold-owl-42");
    link::register_run(&store, "exp-a", &run).unwrap();
    let err = link::register_run(&store, "exp-a", &run).unwrap_err();
    assert!(matches!(err, MlpanelError::RunExists(_)));
}
