//! Linking MLflow experiments and runs into a dataset's run registry.

use tracing::{debug, info};

use crate::error::Result;
use crate::mlflow::{self, Experiment, MlflowClient, Run};
use crate::models::{self, ExperimentRunConfig, MlflowRunConfig, RunConfig};
use crate::store::RunStore;

/// Register an `mlflow_experiment` record for `experiment`, keyed by the
/// experiment name.
pub fn register_experiment(
    store: &RunStore,
    experiment: &Experiment,
    tracking_uri: &str,
) -> Result<()> {
    let config = ExperimentRunConfig {
        experiment_name: experiment.name.clone(),
        experiment_id: experiment.experiment_id.clone(),
        tracking_uri: Some(tracking_uri.to_string()),
        artifact_location: experiment.artifact_location.clone(),
        created_at: experiment.creation_time,
        tags: mlflow::tags_to_map(&experiment.tags),
        runs: vec![],
    };
    store.register_run(&experiment.name, RunConfig::MlflowExperiment(config))?;
    info!("registered experiment '{}'", experiment.name);
    Ok(())
}

/// Register an `mlflow_run` record and append the run to its experiment
/// record's run list.
pub fn register_run(store: &RunStore, experiment_key: &str, run: &Run) -> Result<()> {
    let run_name = run.run_name().unwrap_or(&run.info.run_id).to_string();
    let config = MlflowRunConfig {
        run_name: run_name.clone(),
        run_id: run.info.run_id.clone(),
        run_uuid: run.info.run_uuid.clone(),
        experiment_id: run.info.experiment_id.clone(),
        artifact_uri: run.info.artifact_uri.clone(),
        metrics: mlflow::metrics_to_map(&run.data.metrics),
        tags: mlflow::tags_to_map(&run.data.tags),
    };
    store.register_run(&models::format_run_name(&run_name), RunConfig::MlflowRun(config))?;

    let mut record = store.get_run_info(experiment_key)?;
    if let RunConfig::MlflowExperiment(cfg) = &mut record.config {
        if !cfg.runs.contains(&run_name) {
            cfg.runs.push(run_name.clone());
        }
    }
    store.update_run_config(experiment_key, record.config)?;
    debug!("linked run '{run_name}' under experiment '{experiment_key}'");
    Ok(())
}

/// Link an MLflow experiment, and optionally one of its runs, to the
/// dataset behind `store`. Fetches whatever is not registered yet.
pub async fn link_run_to_dataset(
    store: &RunStore,
    client: &MlflowClient,
    experiment_name: &str,
    run_id: Option<&str>,
) -> Result<()> {
    if !store.has_run(experiment_name) {
        let experiment = client.experiment_by_name(experiment_name).await?;
        register_experiment(store, &experiment, client.base_url())?;
    }
    if let Some(run_id) = run_id {
        let run = client.run(run_id).await?;
        register_run(store, experiment_name, &run)?;
    }
    Ok(())
}
