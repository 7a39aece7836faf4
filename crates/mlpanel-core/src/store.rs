//! Run registry: YAML records linking a dataset to MLflow experiments
//! and runs.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::{MlpanelError, Result};
use crate::models::{self, ExperimentUrl, RunConfig, RunRecord};

const RUNS_DIR: &str = "runs";

/// Per-dataset registry of linked runs, one YAML file per run key.
#[derive(Debug, Clone)]
pub struct RunStore {
    dataset_dir: PathBuf,
}

impl RunStore {
    /// Open the registry for a dataset, creating directories as needed.
    pub fn open(dataset_dir: impl Into<PathBuf>) -> Result<Self> {
        let dataset_dir = dataset_dir.into();
        fs::create_dir_all(dataset_dir.join(RUNS_DIR))?;
        Ok(Self { dataset_dir })
    }

    /// Dataset name, taken from the registry directory.
    pub fn dataset_name(&self) -> String {
        self.dataset_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("default")
            .to_string()
    }

    pub fn dataset_dir(&self) -> &Path {
        &self.dataset_dir
    }

    fn run_path(&self, key: &str) -> PathBuf {
        self.dataset_dir.join(RUNS_DIR).join(format!("{key}.yaml"))
    }

    pub fn has_run(&self, key: &str) -> bool {
        self.run_path(key).exists()
    }

    /// Register a new run under `key`. Fails if the key is taken.
    pub fn register_run(&self, key: &str, config: RunConfig) -> Result<RunRecord> {
        if self.has_run(key) {
            return Err(MlpanelError::RunExists(key.to_string()));
        }
        let record = RunRecord {
            key: key.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            config,
        };
        save_yaml(&self.run_path(key), &record)?;
        Ok(record)
    }

    /// Run keys in the registry, sorted.
    pub fn list_runs(&self) -> Result<Vec<String>> {
        let dir = self.dataset_dir.join(RUNS_DIR);
        if !dir.exists() {
            return Ok(vec![]);
        }
        let mut keys = vec![];
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("yaml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    pub fn get_run_info(&self, key: &str) -> Result<RunRecord> {
        let path = self.run_path(key);
        if !path.exists() {
            return Err(MlpanelError::RunNotFound(key.to_string()));
        }
        load_yaml(&path)
    }

    /// Replace the config of an existing run, keeping its registration
    /// version and timestamp.
    pub fn update_run_config(&self, key: &str, config: RunConfig) -> Result<()> {
        let mut record = self.get_run_info(key)?;
        record.config = config;
        save_yaml(&self.run_path(key), &record)
    }

    /// Experiment pages the panel can offer, one per `mlflow_experiment`
    /// record. Records that fail to parse are skipped.
    pub fn candidate_experiment_urls(&self) -> Result<Vec<ExperimentUrl>> {
        let mut urls = vec![];
        for key in self.list_runs()? {
            let record = match self.get_run_info(&key) {
                Ok(record) => record,
                Err(_) => continue,
            };
            if let RunConfig::MlflowExperiment(cfg) = record.config {
                let url = models::experiment_url(cfg.tracking_uri.as_deref(), &cfg.experiment_id);
                urls.push(ExperimentUrl {
                    name: cfg.experiment_name,
                    url,
                });
            }
        }
        Ok(urls)
    }
}

// ─── YAML record I/O ─────────────────────────────────────────────────────────

fn save_yaml<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    let content = serde_yaml::to_string(data)?;
    fs::write(path, content)?;
    Ok(())
}

fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}
