//! Operator table: the remote-invocation surface of the panel.
//!
//! Operators are plain objects in a flat registry keyed by URI. Execution
//! happens against an [`ExecutionContext`] carrying the dataset's run
//! registry and a `trigger` sink that broadcasts panel events.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::{MlpanelError, Result};
use crate::models::{ExperimentUrlList, PanelEvent, MLFLOW_PANEL_NAME};
use crate::store::RunStore;

/// Namespace prefixed to operator names to form their URIs.
pub const OPERATOR_NAMESPACE: &str = "@mlpanel/mlflow";

/// Icon shipped with the frontend assets.
pub const MLFLOW_ICON: &str = "/assets/mlflow.svg";

/// Toolbar slot next to the samples grid.
pub const SAMPLES_GRID_SECONDARY_ACTIONS: &str = "samples-grid-secondary-actions";

pub fn operator_uri(name: &str) -> String {
    format!("{OPERATOR_NAMESPACE}/{name}")
}

/// Static description of an operator.
#[derive(Debug, Clone, Serialize)]
pub struct OperatorConfig {
    pub name: &'static str,
    pub label: &'static str,
    pub unlisted: bool,
    pub dynamic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<&'static str>,
}

impl OperatorConfig {
    pub fn new(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            unlisted: false,
            dynamic: false,
            icon: None,
        }
    }

    pub fn unlisted(mut self) -> Self {
        self.unlisted = true;
        self
    }

    pub fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }

    pub fn icon(mut self, icon: &'static str) -> Self {
        self.icon = Some(icon);
        self
    }
}

/// Where an operator surfaces as a button in the host UI.
#[derive(Debug, Clone, Serialize)]
pub struct Placement {
    pub place: &'static str,
    pub button: PlacementButton,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacementButton {
    pub label: &'static str,
    pub prompt: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<&'static str>,
}

/// Form description for an operator's input or output.
#[derive(Debug, Clone, Serialize)]
pub struct OperatorSchema {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<SchemaField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaField {
    pub name: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl SchemaField {
    fn text(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            description: None,
            required: false,
            choices: vec![],
        }
    }
}

/// Everything an operator sees while executing.
pub struct ExecutionContext {
    pub store: RunStore,
    pub params: Value,
    events: broadcast::Sender<PanelEvent>,
}

impl ExecutionContext {
    pub fn new(store: RunStore, params: Value, events: broadcast::Sender<PanelEvent>) -> Self {
        Self {
            store,
            params,
            events,
        }
    }

    /// Push an event toward the frontend command table. Dropped silently
    /// when nothing is subscribed.
    pub fn trigger(&self, name: &str, params: Value) {
        let _ = self.events.send(PanelEvent::new(name, params));
    }
}

pub trait Operator: Send + Sync {
    fn config(&self) -> OperatorConfig;

    fn uri(&self) -> String {
        operator_uri(self.config().name)
    }

    fn resolve_placement(&self) -> Option<Placement> {
        None
    }

    fn resolve_input(&self, _ctx: &ExecutionContext) -> Result<Option<OperatorSchema>> {
        Ok(None)
    }

    fn resolve_output(&self) -> Option<OperatorSchema> {
        None
    }

    fn execute(&self, ctx: &ExecutionContext) -> Result<Value>;
}

/// Flat operator table keyed by URI.
#[derive(Default)]
pub struct OperatorRegistry {
    operators: BTreeMap<String, Box<dyn Operator>>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, operator: Box<dyn Operator>) {
        self.operators.insert(operator.uri(), operator);
    }

    pub fn get(&self, uri: &str) -> Option<&dyn Operator> {
        self.operators.get(uri).map(|op| op.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Operator)> {
        self.operators
            .iter()
            .map(|(uri, op)| (uri.as_str(), op.as_ref()))
    }

    pub fn execute(&self, uri: &str, ctx: &ExecutionContext) -> Result<Value> {
        let operator = self
            .get(uri)
            .ok_or_else(|| MlpanelError::UnknownOperator(uri.to_string()))?;
        debug!("executing operator {uri}");
        operator.execute(ctx)
    }
}

/// Registry with every built-in operator registered.
pub fn builtin_registry() -> OperatorRegistry {
    let mut registry = OperatorRegistry::new();
    registry.register(Box::new(OpenMlflowPanel));
    registry.register(Box::new(GetMlflowExperimentUrls));
    registry.register(Box::new(GetMlflowExperimentInfo));
    registry
}

// ─── Built-in operators ──────────────────────────────────────────────────────

/// Opens the MLflow panel in the host workspace.
pub struct OpenMlflowPanel;

impl Operator for OpenMlflowPanel {
    fn config(&self) -> OperatorConfig {
        OperatorConfig::new("open_mlflow_panel", "Open MLflow Panel").icon(MLFLOW_ICON)
    }

    fn resolve_placement(&self) -> Option<Placement> {
        Some(Placement {
            place: SAMPLES_GRID_SECONDARY_ACTIONS,
            button: PlacementButton {
                label: "Open MLflow Panel",
                prompt: false,
                icon: Some(MLFLOW_ICON),
            },
        })
    }

    fn execute(&self, ctx: &ExecutionContext) -> Result<Value> {
        ctx.trigger(
            "open_panel",
            json!({
                "name": MLFLOW_PANEL_NAME,
                "isActive": true,
                "layout": "horizontal",
            }),
        );
        Ok(Value::Null)
    }
}

/// Candidate experiment URLs for the panel's selector.
pub struct GetMlflowExperimentUrls;

impl Operator for GetMlflowExperimentUrls {
    fn config(&self) -> OperatorConfig {
        OperatorConfig::new("get_mlflow_experiment_urls", "MLflow: get experiment URLs").unlisted()
    }

    fn execute(&self, ctx: &ExecutionContext) -> Result<Value> {
        // A missing or unreadable registry yields an empty list, not an error.
        let urls = ctx.store.candidate_experiment_urls().unwrap_or_default();
        Ok(serde_json::to_value(ExperimentUrlList { urls })?)
    }
}

/// Details of one registered experiment run.
pub struct GetMlflowExperimentInfo;

impl GetMlflowExperimentInfo {
    fn experiment_keys(store: &RunStore) -> Vec<String> {
        store
            .list_runs()
            .unwrap_or_default()
            .into_iter()
            .filter(|key| {
                store
                    .get_run_info(key)
                    .map(|record| record.config.as_experiment().is_some())
                    .unwrap_or(false)
            })
            .collect()
    }
}

impl Operator for GetMlflowExperimentInfo {
    fn config(&self) -> OperatorConfig {
        OperatorConfig::new("get_mlflow_experiment_info", "MLflow: get experiment info")
            .dynamic()
            .icon(MLFLOW_ICON)
    }

    fn resolve_input(&self, ctx: &ExecutionContext) -> Result<Option<OperatorSchema>> {
        Ok(Some(OperatorSchema {
            label: "MLflow: choose experiment".to_string(),
            description: Some("Get information about an MLflow experiment".to_string()),
            fields: vec![SchemaField {
                name: "run_key".to_string(),
                label: "Run key".to_string(),
                description: Some("The experiment to retrieve information for".to_string()),
                required: true,
                choices: Self::experiment_keys(&ctx.store),
            }],
        }))
    }

    fn resolve_output(&self) -> Option<OperatorSchema> {
        Some(OperatorSchema {
            label: "MLflow experiment info".to_string(),
            description: None,
            fields: vec![
                SchemaField::text("run_key", "Run key"),
                SchemaField::text("timestamp", "Creation time"),
                SchemaField::text("version", "Version"),
                SchemaField::text("config", "Config"),
            ],
        })
    }

    fn execute(&self, ctx: &ExecutionContext) -> Result<Value> {
        let run_key = ctx
            .params
            .get("run_key")
            .and_then(Value::as_str)
            .ok_or_else(|| MlpanelError::InvalidParams("run_key is required".to_string()))?;
        let info = ctx.store.get_run_info(run_key)?;
        Ok(json!({
            "run_key": run_key,
            "timestamp": info.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            "version": info.version,
            "config": serde_json::to_value(&info.config)?,
        }))
    }
}
