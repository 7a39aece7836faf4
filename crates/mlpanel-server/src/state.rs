//! Shared application state for the Axum server.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use mlpanel_core::models::PanelEvent;
use mlpanel_core::ops::{self, ExecutionContext, OperatorRegistry};
use mlpanel_core::store::RunStore;

#[derive(Clone)]
pub struct AppState {
    pub store: RunStore,
    pub registry: Arc<OperatorRegistry>,
    pub events: broadcast::Sender<PanelEvent>,
}

impl AppState {
    pub fn new(store: RunStore) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            store,
            registry: Arc::new(ops::builtin_registry()),
            events,
        }
    }

    /// Execution context for one operator call.
    pub fn context(&self, params: Value) -> ExecutionContext {
        ExecutionContext::new(self.store.clone(), params, self.events.clone())
    }

    /// Broadcast an event to SSE subscribers. Dropped when none are
    /// connected.
    pub fn broadcast(&self, event: PanelEvent) {
        debug!("broadcasting panel event '{}'", event.name);
        let _ = self.events.send(event);
    }
}

/// Configuration for the web server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub dataset_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from("datasets/quickstart"),
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}
