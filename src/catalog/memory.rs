//! In-memory catalog backed by a concurrent map.

use crate::catalog::{Catalog, Value};
use anyhow::Result;
use dashmap::DashMap;

/// Thread-safe in-memory dataset store. The default for single-process runs
/// and the one tests inject.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    datasets: DashMap<String, Value>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Catalog for MemoryCatalog {
    fn get(&self, name: &str) -> Result<Option<Value>> {
        Ok(self.datasets.get(name).map(|v| v.value().clone()))
    }

    fn set(&self, name: &str, value: Value) -> Result<()> {
        self.datasets.insert(name.to_string(), value);
        Ok(())
    }

    fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.datasets.contains_key(name))
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.datasets.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_get_set_roundtrip() {
        let catalog = MemoryCatalog::new();
        assert!(catalog.get("y").unwrap().is_none());

        catalog.set("y", Value::Series(arr1(&[1.0, 2.0]))).unwrap();
        assert!(catalog.contains("y").unwrap());

        let value = catalog.get("y").unwrap().unwrap();
        assert_eq!(value.as_series().unwrap()[1], 2.0);
    }

    #[test]
    fn test_set_replaces() {
        let catalog = MemoryCatalog::new();
        catalog.set("y", Value::Series(arr1(&[1.0]))).unwrap();
        catalog.set("y", Value::Series(arr1(&[9.0]))).unwrap();

        let value = catalog.get("y").unwrap().unwrap();
        assert_eq!(value.as_series().unwrap()[0], 9.0);
    }

    #[test]
    fn test_keys_sorted() {
        let catalog = MemoryCatalog::new();
        catalog.set("b", Value::Series(arr1(&[1.0]))).unwrap();
        catalog.set("a", Value::Series(arr1(&[1.0]))).unwrap();

        assert_eq!(catalog.keys().unwrap(), vec!["a", "b"]);
    }
}
