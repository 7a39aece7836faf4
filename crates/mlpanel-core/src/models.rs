//! Data models for mlpanel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tracking server address used wherever a record carries none.
pub const DEFAULT_TRACKING_URI: &str = "http://localhost:8080";

/// Panel name the host opens for the MLflow dashboard.
pub const MLFLOW_PANEL_NAME: &str = "MLflowPanel";

/// One candidate experiment the panel can display: the experiment name and
/// the tracking-server page that shows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentUrl {
    pub name: String,
    pub url: String,
}

/// Payload returned by the `get_mlflow_experiment_urls` operator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentUrlList {
    pub urls: Vec<ExperimentUrl>,
}

/// An event pushed from an operator's `trigger` call to the frontend
/// command table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelEvent {
    pub name: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl PanelEvent {
    pub fn new(name: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// Build the tracking-server URL for an experiment page.
pub fn experiment_url(tracking_uri: Option<&str>, experiment_id: &str) -> String {
    let uri = tracking_uri.unwrap_or(DEFAULT_TRACKING_URI);
    format!("{uri}/#/experiments/{experiment_id}")
}

/// Registry keys use `_` where MLflow run names use `-`.
pub fn format_run_name(run_name: &str) -> String {
    run_name.replace('-', "_")
}

/// Registry record for one linked run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub key: String,
    /// Package version at registration time.
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub config: RunConfig,
}

/// Linked-run configuration, discriminated by registration method.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum RunConfig {
    MlflowExperiment(ExperimentRunConfig),
    MlflowRun(MlflowRunConfig),
}

impl RunConfig {
    pub fn method(&self) -> &'static str {
        match self {
            RunConfig::MlflowExperiment(_) => "mlflow_experiment",
            RunConfig::MlflowRun(_) => "mlflow_run",
        }
    }

    pub fn as_experiment(&self) -> Option<&ExperimentRunConfig> {
        match self {
            RunConfig::MlflowExperiment(cfg) => Some(cfg),
            _ => None,
        }
    }
}

/// Record config for a linked MLflow experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentRunConfig {
    pub experiment_name: String,
    pub experiment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_location: Option<String>,
    /// Creation time reported by the tracking server, ms since epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Names of MLflow runs linked under this experiment.
    #[serde(default)]
    pub runs: Vec<String>,
}

/// Record config for one linked MLflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlflowRunConfig {
    pub run_name: String,
    pub run_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_uuid: Option<String>,
    pub experiment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_uri: Option<String>,
    #[serde(default)]
    pub metrics: HashMap<String, f64>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}
