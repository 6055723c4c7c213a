//! A small column-oriented table, just enough for the preprocessing nodes.

use anyhow::{bail, Context, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Float(f64),
    Str(String),
}

impl Cell {
    /// Join/group key for this cell. Nulls never match anything.
    fn key(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Float(f) => Some(f.to_string()),
            Cell::Str(s) => Some(s.clone()),
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

/// A column-oriented table with insertion-ordered columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table from header names and row-major cells.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            anyhow::ensure!(
                row.len() == headers.len(),
                "row {} has {} cells, expected {}",
                i,
                row.len(),
                headers.len()
            );
        }
        let columns = headers
            .into_iter()
            .enumerate()
            .map(|(c, name)| Column {
                name,
                cells: rows.iter().map(|r| r[c].clone()).collect(),
            })
            .collect();
        Ok(Self { columns })
    }

    /// Append a column. The length must match existing columns.
    pub fn push_column(&mut self, name: impl Into<String>, cells: Vec<Cell>) -> Result<()> {
        let name = name.into();
        anyhow::ensure!(
            self.columns.is_empty() || cells.len() == self.n_rows(),
            "column `{}` has {} cells, table has {} rows",
            name,
            cells.len(),
            self.n_rows()
        );
        anyhow::ensure!(
            self.column(&name).is_none(),
            "table already has a column named `{}`",
            name
        );
        self.columns.push(Column { name, cells });
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.cells.len())
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn column_mut(&mut self, name: &str) -> Result<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .with_context(|| format!("table has no column `{name}`"))
    }

    /// Parse a percentage column ("100%" -> 1.0) into floats in place.
    pub fn parse_percentage(&mut self, name: &str) -> Result<()> {
        self.map_column(name, |cell| match cell {
            Cell::Str(s) => {
                let trimmed = s.trim().trim_end_matches('%');
                if trimmed.is_empty() {
                    Ok(Cell::Null)
                } else {
                    let v: f64 = trimmed
                        .parse()
                        .with_context(|| format!("invalid percentage `{s}`"))?;
                    Ok(Cell::Float(v / 100.0))
                }
            }
            Cell::Float(f) => Ok(Cell::Float(f / 100.0)),
            other => Ok(other),
        })
    }

    /// Parse a money column ("$1,325.0" -> 1325.0) into floats in place.
    pub fn parse_money(&mut self, name: &str) -> Result<()> {
        self.map_column(name, |cell| match cell {
            Cell::Str(s) => {
                let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
                let cleaned = cleaned.trim();
                if cleaned.is_empty() {
                    Ok(Cell::Null)
                } else {
                    let v: f64 = cleaned
                        .parse()
                        .with_context(|| format!("invalid money value `{s}`"))?;
                    Ok(Cell::Float(v))
                }
            }
            other => Ok(other),
        })
    }

    /// Parse a truthy/falsy column ("t"/"f", "true"/"false", "yes"/"no")
    /// into booleans in place.
    pub fn parse_bool(&mut self, name: &str) -> Result<()> {
        self.map_column(name, |cell| match cell {
            Cell::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "t" | "true" | "yes" => Ok(Cell::Bool(true)),
                "f" | "false" | "no" => Ok(Cell::Bool(false)),
                "" => Ok(Cell::Null),
                other => bail!("invalid boolean value `{other}`"),
            },
            other => Ok(other),
        })
    }

    fn map_column(&mut self, name: &str, f: impl Fn(Cell) -> Result<Cell>) -> Result<()> {
        let column = self.column_mut(name)?;
        let cells = std::mem::take(&mut column.cells);
        column.cells = cells.into_iter().map(f).collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    /// Inner join on `self[left_key] == other[right_key]`.
    ///
    /// The right key column is dropped from the result; any other column name
    /// shared by both sides is an error. Null keys never match.
    pub fn inner_join(&self, other: &Table, left_key: &str, right_key: &str) -> Result<Table> {
        let left_col = self
            .column(left_key)
            .with_context(|| format!("left table has no column `{left_key}`"))?;
        let right_col = other
            .column(right_key)
            .with_context(|| format!("right table has no column `{right_key}`"))?;

        for col in &other.columns {
            if col.name != right_key && self.column(&col.name).is_some() {
                bail!("join would duplicate column `{}`", col.name);
            }
        }

        // Hash the right side by key, preserving row order per key.
        let mut right_rows: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, cell) in right_col.cells.iter().enumerate() {
            if let Some(k) = cell.key() {
                right_rows.entry(k).or_default().push(i);
            }
        }

        let mut left_idx = Vec::new();
        let mut right_idx = Vec::new();
        for (i, cell) in left_col.cells.iter().enumerate() {
            let Some(k) = cell.key() else { continue };
            if let Some(matches) = right_rows.get(&k) {
                for &j in matches {
                    left_idx.push(i);
                    right_idx.push(j);
                }
            }
        }

        let mut joined = Table::default();
        for col in &self.columns {
            let cells = left_idx.iter().map(|&i| col.cells[i].clone()).collect();
            joined.push_column(col.name.clone(), cells)?;
        }
        for col in &other.columns {
            if col.name == right_key {
                continue;
            }
            let cells = right_idx.iter().map(|&j| col.cells[j].clone()).collect();
            joined.push_column(col.name.clone(), cells)?;
        }
        Ok(joined)
    }

    /// Drop every row containing a null cell.
    pub fn drop_nulls(&self) -> Table {
        let keep: Vec<usize> = (0..self.n_rows())
            .filter(|&r| !self.columns.iter().any(|c| c.cells[r].is_null()))
            .collect();
        self.take_rows(&keep)
    }

    /// A new table with only the given columns, in the given order.
    pub fn select(&self, names: &[String]) -> Result<Table> {
        let mut out = Table::default();
        for name in names {
            let col = self
                .column(name)
                .with_context(|| format!("table has no column `{name}`"))?;
            out.push_column(col.name.clone(), col.cells.clone())?;
        }
        Ok(out)
    }

    /// A new table with the given rows, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    cells: indices.iter().map(|&i| c.cells[i].clone()).collect(),
                })
                .collect(),
        }
    }

    /// Extract a single column as floats. Booleans become 0.0/1.0.
    pub fn float_column(&self, name: &str) -> Result<Array1<f64>> {
        let col = self
            .column(name)
            .with_context(|| format!("table has no column `{name}`"))?;
        let values = col
            .cells
            .iter()
            .enumerate()
            .map(|(i, cell)| match cell {
                Cell::Float(f) => Ok(*f),
                Cell::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
                Cell::Null => bail!("null in numeric column `{name}` at row {i}"),
                Cell::Str(s) => bail!("non-numeric value `{s}` in column `{name}` at row {i}"),
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(Array1::from_vec(values))
    }

    /// Convert every column to a feature matrix, one column per feature.
    pub fn to_matrix(&self) -> Result<Array2<f64>> {
        let n = self.n_rows();
        let p = self.n_cols();
        let mut m = Array2::zeros((n, p));
        for (c, col) in self.columns.iter().enumerate() {
            let values = self.float_column(&col.name)?;
            m.column_mut(c).assign(&values);
        }
        Ok(m)
    }

    /// Group by a key column and average a float column per group.
    ///
    /// Groups appear in order of first appearance; the result has the key
    /// column and a `mean_<value>` column.
    pub fn group_mean(&self, key: &str, value: &str) -> Result<Table> {
        let key_col = self
            .column(key)
            .with_context(|| format!("table has no column `{key}`"))?;
        let values = self.float_column(value)?;

        let mut order: Vec<String> = Vec::new();
        let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
        for (i, cell) in key_col.cells.iter().enumerate() {
            let Some(k) = cell.key() else { continue };
            if !sums.contains_key(&k) {
                order.push(k.clone());
            }
            let entry = sums.entry(k).or_insert((0.0, 0));
            entry.0 += values[i];
            entry.1 += 1;
        }

        let mut out = Table::default();
        out.push_column(
            key,
            order.iter().map(|k| Cell::Str(k.clone())).collect(),
        )?;
        out.push_column(
            format!("mean_{value}"),
            order
                .iter()
                .map(|k| {
                    let (sum, count) = sums[k];
                    Cell::Float(sum / count as f64)
                })
                .collect(),
        )?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[Cell]]) -> Table {
        Table::from_rows(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter().map(|r| r.to_vec()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_percentage() {
        let mut t = table(
            &["rating"],
            &[
                &[Cell::Str("100%".into())],
                &[Cell::Str("67%".into())],
                &[Cell::Null],
            ],
        );
        t.parse_percentage("rating").unwrap();

        let col = t.column("rating").unwrap();
        assert_eq!(col.cells[0], Cell::Float(1.0));
        assert_eq!(col.cells[1], Cell::Float(0.67));
        assert_eq!(col.cells[2], Cell::Null);
    }

    #[test]
    fn test_parse_money() {
        let mut t = table(&["price"], &[&[Cell::Str("$1,325.0".into())]]);
        t.parse_money("price").unwrap();
        assert_eq!(t.column("price").unwrap().cells[0], Cell::Float(1325.0));
    }

    #[test]
    fn test_parse_bool() {
        let mut t = table(
            &["flag"],
            &[&[Cell::Str("t".into())], &[Cell::Str("f".into())]],
        );
        t.parse_bool("flag").unwrap();
        assert_eq!(t.column("flag").unwrap().cells[0], Cell::Bool(true));
        assert_eq!(t.column("flag").unwrap().cells[1], Cell::Bool(false));
    }

    #[test]
    fn test_parse_bool_rejects_garbage() {
        let mut t = table(&["flag"], &[&[Cell::Str("maybe".into())]]);
        assert!(t.parse_bool("flag").is_err());
    }

    #[test]
    fn test_inner_join() {
        let left = table(
            &["id", "company_id"],
            &[
                &[Cell::Float(1.0), Cell::Float(10.0)],
                &[Cell::Float(2.0), Cell::Float(20.0)],
                &[Cell::Float(3.0), Cell::Float(99.0)],
            ],
        );
        let right = table(
            &["cid", "rating"],
            &[
                &[Cell::Float(10.0), Cell::Float(0.9)],
                &[Cell::Float(20.0), Cell::Float(0.5)],
            ],
        );

        let joined = left.inner_join(&right, "company_id", "cid").unwrap();
        assert_eq!(joined.n_rows(), 2);
        assert_eq!(joined.column_names(), vec!["id", "company_id", "rating"]);
        assert_eq!(joined.column("rating").unwrap().cells[0], Cell::Float(0.9));
    }

    #[test]
    fn test_join_rejects_duplicate_columns() {
        let left = table(&["id", "x"], &[&[Cell::Float(1.0), Cell::Float(2.0)]]);
        let right = table(&["id2", "x"], &[&[Cell::Float(1.0), Cell::Float(3.0)]]);
        assert!(left.inner_join(&right, "id", "id2").is_err());
    }

    #[test]
    fn test_drop_nulls() {
        let t = table(
            &["a", "b"],
            &[
                &[Cell::Float(1.0), Cell::Float(2.0)],
                &[Cell::Float(3.0), Cell::Null],
            ],
        );
        let clean = t.drop_nulls();
        assert_eq!(clean.n_rows(), 1);
        assert_eq!(clean.column("a").unwrap().cells[0], Cell::Float(1.0));
    }

    #[test]
    fn test_to_matrix_with_bools() {
        let t = table(
            &["x", "flag"],
            &[
                &[Cell::Float(1.0), Cell::Bool(true)],
                &[Cell::Float(2.0), Cell::Bool(false)],
            ],
        );
        let m = t.to_matrix().unwrap();
        assert_eq!(m.shape(), &[2, 2]);
        assert_eq!(m[[0, 1]], 1.0);
        assert_eq!(m[[1, 1]], 0.0);
    }

    #[test]
    fn test_group_mean() {
        let t = table(
            &["kind", "capacity"],
            &[
                &[Cell::Str("Type F5".into()), Cell::Float(4.0)],
                &[Cell::Str("Type V5".into()), Cell::Float(10.0)],
                &[Cell::Str("Type F5".into()), Cell::Float(6.0)],
            ],
        );
        let agg = t.group_mean("kind", "capacity").unwrap();
        assert_eq!(agg.n_rows(), 2);
        assert_eq!(agg.column("kind").unwrap().cells[0], Cell::Str("Type F5".into()));
        assert_eq!(agg.column("mean_capacity").unwrap().cells[0], Cell::Float(5.0));
        assert_eq!(agg.column("mean_capacity").unwrap().cells[1], Cell::Float(10.0));
    }

    #[test]
    fn test_select_order() {
        let t = table(
            &["a", "b", "c"],
            &[&[Cell::Float(1.0), Cell::Float(2.0), Cell::Float(3.0)]],
        );
        let s = t.select(&["c".to_string(), "a".to_string()]).unwrap();
        assert_eq!(s.column_names(), vec!["c", "a"]);
    }
}
