//! mlpanel-core: run registry, MLflow client and operator table for the
//! MLflow dashboard panel.
//!
//! Native builds get the registry, the REST client and the operators; the
//! wasm frontend only pulls the wire models.

pub mod error;
pub mod models;

#[cfg(not(target_arch = "wasm32"))]
pub mod link;
#[cfg(not(target_arch = "wasm32"))]
pub mod mlflow;
#[cfg(not(target_arch = "wasm32"))]
pub mod ops;
#[cfg(not(target_arch = "wasm32"))]
pub mod store;

pub use error::MlpanelError;
pub use models::{ExperimentUrl, ExperimentUrlList, PanelEvent};
#[cfg(not(target_arch = "wasm32"))]
pub use ops::{ExecutionContext, Operator, OperatorRegistry};
#[cfg(not(target_arch = "wasm32"))]
pub use store::RunStore;
