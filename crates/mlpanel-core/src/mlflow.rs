//! Minimal MLflow REST client: the two lookups linking needs.

use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{MlpanelError, Result};
use crate::models::DEFAULT_TRACKING_URI;

/// Client for an MLflow tracking server's REST API.
#[derive(Debug, Clone)]
pub struct MlflowClient {
    base_url: String,
    client: reqwest::Client,
}

impl MlflowClient {
    pub fn new(tracking_uri: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("mlpanel/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: tracking_uri.into(),
            client,
        })
    }

    pub fn with_default_uri() -> Result<Self> {
        Self::new(DEFAULT_TRACKING_URI)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Look up an experiment by name.
    pub async fn experiment_by_name(&self, name: &str) -> Result<Experiment> {
        let url = format!("{}/api/2.0/mlflow/experiments/get-by-name", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("experiment_name", name)])
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(MlpanelError::ExperimentNotFound(name.to_string()));
        }
        let response = check_api_error(response).await?;
        let body: GetExperimentResponse = response.json().await?;
        Ok(body.experiment)
    }

    /// Fetch a run by id.
    pub async fn run(&self, run_id: &str) -> Result<Run> {
        let url = format!("{}/api/2.0/mlflow/runs/get", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("run_id", run_id)])
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(MlpanelError::RunNotFound(run_id.to_string()));
        }
        let response = check_api_error(response).await?;
        let body: GetRunResponse = response.json().await?;
        Ok(body.run)
    }
}

async fn check_api_error(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let detail = response
        .json::<ApiError>()
        .await
        .map(|e| e.message)
        .unwrap_or_else(|_| status.to_string());
    Err(MlpanelError::Mlflow(detail))
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct GetExperimentResponse {
    experiment: Experiment,
}

#[derive(Debug, Deserialize)]
struct GetRunResponse {
    run: Run,
}

/// An experiment as returned by the tracking server.
#[derive(Debug, Clone, Deserialize)]
pub struct Experiment {
    pub experiment_id: String,
    pub name: String,
    #[serde(default)]
    pub artifact_location: Option<String>,
    #[serde(default)]
    pub lifecycle_stage: Option<String>,
    #[serde(default)]
    pub creation_time: Option<i64>,
    #[serde(default)]
    pub last_update_time: Option<i64>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    pub info: RunInfo,
    #[serde(default)]
    pub data: RunData,
}

impl Run {
    /// Display name, taken from the `mlflow.runName` tag.
    pub fn run_name(&self) -> Option<&str> {
        self.data
            .tags
            .iter()
            .find(|t| t.key == "mlflow.runName")
            .map(|t| t.value.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunInfo {
    pub run_id: String,
    #[serde(default)]
    pub run_uuid: Option<String>,
    pub experiment_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub artifact_uri: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunData {
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub params: Vec<Tag>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Metric {
    pub key: String,
    pub value: f64,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub step: i64,
}

pub fn tags_to_map(tags: &[Tag]) -> HashMap<String, String> {
    tags.iter()
        .map(|t| (t.key.clone(), t.value.clone()))
        .collect()
}

pub fn metrics_to_map(metrics: &[Metric]) -> HashMap<String, f64> {
    metrics.iter().map(|m| (m.key.clone(), m.value)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Serves one canned HTTP response and hangs up.
    async fn one_shot_server(status_line: &'static str, body: &'static str) -> std::net::SocketAddr {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut request = [0u8; 2048];
                let _ = socket.read(&mut request).await;
                let response = format!(
                    "HTTP/1.1 {status_line}\r\n\
                     content-type: application/json\r\n\
                     content-length: {}\r\n\
                     connection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_missing_run_maps_to_run_not_found() {
        let addr = one_shot_server(
            "404 Not Found",
            r#"{"error_code": "RESOURCE_DOES_NOT_EXIST", "message": "Run 'missing' not found"}"#,
        )
        .await;

        let client = MlflowClient::new(format!("http://{addr}")).unwrap();
        let err = client.run("missing").await.unwrap_err();
        assert!(matches!(err, MlpanelError::RunNotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn test_missing_experiment_maps_to_experiment_not_found() {
        let addr = one_shot_server(
            "404 Not Found",
            r#"{"error_code": "RESOURCE_DOES_NOT_EXIST", "message": "No experiment 'nope'"}"#,
        )
        .await;

        let client = MlflowClient::new(format!("http://{addr}")).unwrap();
        let err = client.experiment_by_name("nope").await.unwrap_err();
        assert!(matches!(err, MlpanelError::ExperimentNotFound(name) if name == "nope"));
    }

    #[test]
    fn test_parse_get_experiment_response() {
        let body = r#"{
            "experiment": {
                "experiment_id": "3",
                "name": "detector-v2",
                "artifact_location": "mlflow-artifacts:/3",
                "lifecycle_stage": "active",
                "creation_time": 1700000000000,
                "last_update_time": 1700000500000,
                "tags": [{"key": "team", "value": "vision"}]
            }
        }"#;
        let parsed: GetExperimentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.experiment.experiment_id, "3");
        assert_eq!(parsed.experiment.name, "detector-v2");
        assert_eq!(tags_to_map(&parsed.experiment.tags)["team"], "vision");
    }

    #[test]
    fn test_run_name_from_tags() {
        let body = r#"{
            "run": {
                "info": {
                    "run_id": "abc123",
                    "run_uuid": "abc123",
                    "experiment_id": "3",
                    "status": "FINISHED",
                    "artifact_uri": "mlflow-artifacts:/3/abc123/artifacts"
                },
                "data": {
                    "metrics": [{"key": "loss", "value": 0.12, "timestamp": 1, "step": 10}],
                    "tags": [{"key": "mlflow.runName", "value": "bold-owl-42"}]
                }
            }
        }"#;
        let parsed: GetRunResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.run.run_name(), Some("bold-owl-42"));
        assert_eq!(metrics_to_map(&parsed.run.data.metrics)["loss"], 0.12);
    }
}
