//! The data catalog: named dataset storage injected into every run.

mod fs;
mod memory;

pub use fs::FsCatalog;
pub use memory::MemoryCatalog;

use crate::config::ModelOptions;
use crate::data::Table;
use crate::metrics::Report;
use crate::model::LinearModel;
use anyhow::{Context, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A dataset payload flowing between nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Value {
    Table(Table),
    Series(Array1<f64>),
    Model(LinearModel),
    Report(Report),
    Params(ModelOptions),
}

impl Value {
    pub fn as_table(&self) -> Result<&Table> {
        match self {
            Value::Table(t) => Ok(t),
            other => anyhow::bail!("expected a table, got {}", other.kind()),
        }
    }

    pub fn as_series(&self) -> Result<&Array1<f64>> {
        match self {
            Value::Series(s) => Ok(s),
            other => anyhow::bail!("expected a series, got {}", other.kind()),
        }
    }

    pub fn as_model(&self) -> Result<&LinearModel> {
        match self {
            Value::Model(m) => Ok(m),
            other => anyhow::bail!("expected a model, got {}", other.kind()),
        }
    }

    pub fn as_report(&self) -> Result<&Report> {
        match self {
            Value::Report(r) => Ok(r),
            other => anyhow::bail!("expected a report, got {}", other.kind()),
        }
    }

    pub fn as_params(&self) -> Result<&ModelOptions> {
        match self {
            Value::Params(p) => Ok(p),
            other => anyhow::bail!("expected parameters, got {}", other.kind()),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Table(_) => "a table",
            Value::Series(_) => "a series",
            Value::Model(_) => "a model",
            Value::Report(_) => "a report",
            Value::Params(_) => "parameters",
        }
    }
}

/// Keyed dataset storage.
///
/// An explicit collaborator passed into execution, never a process-wide
/// singleton; tests inject a [`MemoryCatalog`]. Keys match node input/output
/// declarations exactly.
pub trait Catalog: Send + Sync {
    /// Fetch a dataset by name.
    fn get(&self, name: &str) -> Result<Option<Value>>;

    /// Store a dataset under a name, replacing any previous value.
    fn set(&self, name: &str, value: Value) -> Result<()>;

    /// Whether a dataset exists.
    fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.get(name)?.is_some())
    }

    /// All dataset names currently stored, sorted.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Fetch a dataset that must exist.
pub fn require(catalog: &dyn Catalog, name: &str) -> Result<Value> {
    catalog
        .get(name)?
        .with_context(|| format!("dataset `{name}` is not in the catalog"))
}
