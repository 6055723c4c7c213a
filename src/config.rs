//! Configuration for the spaceflow pipeline project.

use crate::runner::RunnerKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Project identity
    #[serde(default)]
    pub project: ProjectConfig,

    /// Raw dataset locations
    #[serde(default)]
    pub data: DataConfig,

    /// Catalog storage
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Parameters consumed by the data-science nodes
    #[serde(default)]
    pub model_options: ModelOptions,

    /// Execution tuning
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Optional run artifacts
    #[serde(default)]
    pub output: OutputConfig,

    /// External-scheduler export settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Project identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Package name used in task exports
    #[serde(default = "default_project_name")]
    pub name: String,

    /// Project root the scheduler tasks run against
    #[serde(default = "default_project_path")]
    pub path: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            path: default_project_path(),
        }
    }
}

/// Raw dataset CSV locations, loaded into the catalog before a run.
/// Any entry left unset is expected to already be in the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub companies: Option<PathBuf>,

    #[serde(default)]
    pub shuttles: Option<PathBuf>,

    #[serde(default)]
    pub reviews: Option<PathBuf>,
}

/// Catalog storage selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory for the filesystem catalog. When unset, runs use an
    /// in-memory catalog; scheduled per-node tasks need this set so
    /// intermediate datasets survive across processes.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Parameters for `split_data` and friends, injected into the catalog
/// under `params:model_options`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Feature columns of the model input table
    #[serde(default = "default_features")]
    pub features: Vec<String>,

    /// Fraction of rows held out for testing
    #[serde(default = "default_test_size")]
    pub test_size: f64,

    /// Seed for the shuffle split
    #[serde(default = "default_random_state")]
    pub random_state: u64,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            features: default_features(),
            test_size: default_test_size(),
            random_state: default_random_state(),
        }
    }
}

/// Execution tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Runner variant
    #[serde(default)]
    pub runner: RunnerKind,

    /// Maximum nodes in flight for the parallel runner
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Tokio worker threads (None = num CPUs)
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            runner: RunnerKind::default(),
            concurrency: default_concurrency(),
            worker_threads: None,
        }
    }
}

/// Optional run artifacts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory to export `X_test.csv` / `y_test.csv` after a training run.
    /// Replaces the hardcoded home-directory path of earlier tooling.
    #[serde(default)]
    pub test_dir: Option<PathBuf>,
}

/// Settings for the external-scheduler task export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_dag_id")]
    pub dag_id: String,

    #[serde(default = "default_schedule")]
    pub schedule: String,

    /// Retries the scheduler applies per task (the core itself never retries)
    #[serde(default = "default_retries")]
    pub retries: usize,

    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Environment name the tasks run with
    #[serde(default = "default_env")]
    pub env: String,

    /// Configuration source directory the tasks load from
    #[serde(default = "default_conf_source")]
    pub conf_source: PathBuf,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            dag_id: default_dag_id(),
            schedule: default_schedule(),
            retries: default_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            env: default_env(),
            conf_source: default_conf_source(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML or JSON file.
    /// Format is auto-detected from file extension (.yaml, .yml, or .json).
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Config = match ext {
            "json" => serde_json::from_str(&contents)?,
            // YAML is a superset of JSON, so it also covers unknown extensions.
            _ => serde_yaml::from_str(&contents)?,
        };
        Ok(config)
    }

    /// Load configuration from a conf directory with an environment overlay.
    ///
    /// Reads `<dir>/base.yaml`, then deep-merges `<dir>/<env>.yaml` over it
    /// when that file exists. Either file may be absent; with both absent the
    /// defaults apply.
    pub fn load(conf_dir: &Path, env: &str) -> anyhow::Result<Self> {
        let base_path = conf_dir.join("base.yaml");
        let env_path = conf_dir.join(format!("{env}.yaml"));

        let mut merged = serde_yaml::Value::Mapping(Default::default());
        for path in [&base_path, &env_path] {
            if !path.exists() {
                continue;
            }
            let contents = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
            let overlay: serde_yaml::Value = serde_yaml::from_str(&contents)?;
            merge_yaml(&mut merged, overlay);
        }

        Ok(serde_yaml::from_value(merged)?)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.model_options.features.is_empty() {
            anyhow::bail!("model_options.features must not be empty");
        }
        if !(self.model_options.test_size > 0.0 && self.model_options.test_size < 1.0) {
            anyhow::bail!("model_options.test_size must be in (0, 1)");
        }
        if self.execution.concurrency == 0 {
            anyhow::bail!("execution.concurrency must be > 0");
        }
        if self.scheduler.dag_id.is_empty() {
            anyhow::bail!("scheduler.dag_id must not be empty");
        }
        Ok(())
    }
}

/// Recursively merge `overlay` into `base`; mappings merge per key,
/// everything else is replaced.
fn merge_yaml(base: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(base_map), serde_yaml::Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base_slot, overlay_value) => *base_slot = overlay_value,
    }
}

// Default value functions for serde
fn default_project_name() -> String {
    "spaceflow".to_string()
}
fn default_project_path() -> PathBuf {
    PathBuf::from(".")
}
fn default_features() -> Vec<String> {
    [
        "engines",
        "passenger_capacity",
        "crew",
        "d_check_complete",
        "moon_clearance_complete",
        "iata_approved",
        "company_rating",
        "review_scores_rating",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_test_size() -> f64 {
    0.2
}
fn default_random_state() -> u64 {
    3
}
fn default_concurrency() -> usize {
    4
}
fn default_dag_id() -> String {
    "spaceflow".to_string()
}
fn default_schedule() -> String {
    "@once".to_string()
}
fn default_retries() -> usize {
    1
}
fn default_retry_delay_secs() -> u64 {
    300
}
fn default_env() -> String {
    "local".to_string()
}
fn default_conf_source() -> PathBuf {
    PathBuf::from("conf")
}
