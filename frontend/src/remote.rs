//! Calls to the embedding server: operator execution and the reachability
//! probe.

use leptos::prelude::*;
use leptos::task::spawn_local;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// URI of the operator listing candidate experiment URLs.
pub const EXPERIMENT_URLS_URI: &str = "@mlpanel/mlflow/get_mlflow_experiment_urls";

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PanelConfig {
    pub version: String,
    pub dataset: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PlacementEntry {
    pub uri: String,
    pub placement: PlacementDetails,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PlacementDetails {
    pub place: String,
    pub button: PlacementButton,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PlacementButton {
    pub label: String,
    #[serde(default)]
    pub prompt: bool,
    #[serde(default)]
    pub icon: Option<String>,
}

pub async fn fetch_config() -> Result<PanelConfig, String> {
    let resp = gloo_net::http::Request::get("/api/config")
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !resp.ok() {
        return Err(format!("Error fetching config: {}", resp.status()));
    }

    let text = resp.text().await.map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

pub async fn fetch_placements() -> Result<Vec<PlacementEntry>, String> {
    let resp = gloo_net::http::Request::get("/api/operators/placements")
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !resp.ok() {
        return Err(format!("Error fetching placements: {}", resp.status()));
    }

    let text = resp.text().await.map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

/// Execute a backend operator and return its raw JSON result.
pub async fn execute_operator(
    uri: &str,
    params: &serde_json::Value,
) -> Result<serde_json::Value, String> {
    let resp = gloo_net::http::Request::post(&format!("/api/operators/execute/{}", uri))
        .json(params)
        .map_err(|e| e.to_string())?
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !resp.ok() {
        return Err(format!("Error executing {}: {}", uri, resp.status()));
    }

    let text = resp.text().await.map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

/// One reachability check. An opaque no-cors response still counts as
/// reachable; only a network-level failure counts as down.
pub async fn probe_server(url: &str) -> bool {
    gloo_net::http::Request::get(url)
        .mode(web_sys::RequestMode::NoCors)
        .send()
        .await
        .is_ok()
}

/// Observable handle on one backend operator.
///
/// `trigger` advances a generation counter; a response arriving for an older
/// generation (superseded or cancelled) is dropped instead of written back.
pub struct OperatorExecutor<T: Send + Sync + 'static> {
    uri: &'static str,
    generation: StoredValue<u64>,
    pub pending: RwSignal<bool>,
    pub result: RwSignal<Option<T>>,
    pub error: RwSignal<Option<String>>,
}

impl<T: Send + Sync + 'static> Clone for OperatorExecutor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Send + Sync + 'static> Copy for OperatorExecutor<T> {}

impl<T: DeserializeOwned + Send + Sync + 'static> OperatorExecutor<T> {
    pub fn new(uri: &'static str) -> Self {
        Self {
            uri,
            generation: StoredValue::new(0),
            pending: RwSignal::new(false),
            result: RwSignal::new(None),
            error: RwSignal::new(None),
        }
    }

    pub fn trigger(&self, params: serde_json::Value) {
        self.generation.update_value(|g| *g += 1);
        let generation = self.generation.get_value();
        self.pending.set(true);
        self.error.set(None);

        let executor = *self;
        spawn_local(async move {
            let outcome = execute_operator(executor.uri, &params).await;
            // A newer trigger, a cancel, or disposal obsoletes this response.
            if executor.generation.try_get_value() != Some(generation) {
                return;
            }
            match outcome
                .and_then(|value| serde_json::from_value::<T>(value).map_err(|e| e.to_string()))
            {
                Ok(value) => executor.result.set(Some(value)),
                Err(e) => {
                    log::warn!("operator {} failed: {}", executor.uri, e);
                    executor.error.set(Some(e));
                }
            }
            executor.pending.set(false);
        });
    }

    /// Drop whatever call is in flight, e.g. when the owning view unmounts.
    pub fn cancel(&self) {
        let _ = self.generation.try_update_value(|g| *g += 1);
    }
}
