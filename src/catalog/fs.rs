//! Filesystem catalog: one JSON file per dataset.
//!
//! Lets independently scheduled per-node tasks share intermediate datasets
//! across processes. The format is this crate's own serde encoding; dataset
//! names map to `<name>.json` with path separators rejected.

use crate::catalog::{Catalog, Value};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Dataset store spilling every value to a JSON file in one directory.
#[derive(Debug)]
pub struct FsCatalog {
    dir: PathBuf,
}

impl FsCatalog {
    /// Open (creating if needed) a catalog directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create catalog dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            bail!("invalid dataset name `{name}`");
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}

impl Catalog for FsCatalog {
    fn get(&self, name: &str) -> Result<Option<Value>> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let value = serde_json::from_str(&contents)
            .with_context(|| format!("corrupt dataset file {}", path.display()))?;
        Ok(Some(value))
    }

    fn set(&self, name: &str, value: Value) -> Result<()> {
        let path = self.path_for(name)?;
        let json = serde_json::to_string(&value)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
