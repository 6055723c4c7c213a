//! Minimal CSV reading and writing for catalog datasets.
//!
//! Header line plus comma-separated rows with double-quote escaping. Cells
//! are type-sniffed on read: empty -> null, numeric -> float, literal
//! true/false -> bool, everything else stays a string (so `t`/`f` style
//! flags survive for the preprocessing nodes to interpret).

use crate::data::{Cell, Table};
use anyhow::{Context, Result};
use ndarray::Array1;
use std::path::Path;

/// Read a CSV file into a table.
pub fn read_table(path: &Path) -> Result<Table> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut lines = contents.lines();

    let header_line = lines
        .next()
        .with_context(|| format!("{} is empty", path.display()))?;
    let headers = split_line(header_line);

    let mut rows = Vec::new();
    for (i, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_line(line);
        anyhow::ensure!(
            fields.len() == headers.len(),
            "{}: row {} has {} fields, expected {}",
            path.display(),
            i + 2,
            fields.len(),
            headers.len()
        );
        rows.push(fields.into_iter().map(|f| sniff_cell(&f)).collect());
    }

    Table::from_rows(headers, rows)
}

/// Write a table as CSV.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let mut out = String::new();
    out.push_str(
        &table
            .column_names()
            .iter()
            .map(|n| quote_field(n))
            .collect::<Vec<_>>()
            .join(","),
    );
    out.push('\n');

    for r in 0..table.n_rows() {
        let row: Vec<String> = table
            .columns()
            .iter()
            .map(|col| match &col.cells[r] {
                Cell::Null => String::new(),
                Cell::Bool(b) => b.to_string(),
                Cell::Float(f) => f.to_string(),
                Cell::Str(s) => quote_field(s),
            })
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    std::fs::write(path, out).with_context(|| format!("failed to write {}", path.display()))
}

/// Write a numeric series as a single-column CSV.
pub fn write_series(path: &Path, name: &str, values: &Array1<f64>) -> Result<()> {
    let mut out = String::with_capacity(values.len() * 8 + name.len());
    out.push_str(name);
    out.push('\n');
    for v in values {
        out.push_str(&v.to_string());
        out.push('\n');
    }
    std::fs::write(path, out).with_context(|| format!("failed to write {}", path.display()))
}

/// Split a CSV line, honoring double-quoted fields and `""` escapes.
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields.iter().map(|f| f.trim().to_string()).collect()
}

fn sniff_cell(field: &str) -> Cell {
    if field.is_empty() {
        Cell::Null
    } else if let Ok(f) = field.parse::<f64>() {
        Cell::Float(f)
    } else if field.eq_ignore_ascii_case("true") {
        Cell::Bool(true)
    } else if field.eq_ignore_ascii_case("false") {
        Cell::Bool(false)
    } else {
        Cell::Str(field.to_string())
    }
}

fn quote_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_read_table_sniffs_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "id,name,price,approved\n1,Acme,9.5,t\n2,,3.25,f\n").unwrap();

        let t = read_table(&path).unwrap();
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.column("id").unwrap().cells[0], Cell::Float(1.0));
        assert_eq!(t.column("name").unwrap().cells[0], Cell::Str("Acme".into()));
        assert_eq!(t.column("name").unwrap().cells[1], Cell::Null);
        // `t`/`f` stays a string until parse_bool runs.
        assert_eq!(t.column("approved").unwrap().cells[0], Cell::Str("t".into()));
    }

    #[test]
    fn test_quoted_fields() {
        let fields = split_line(r#"1,"Acme, Inc.","she said ""hi""""#);
        assert_eq!(fields, vec!["1", "Acme, Inc.", r#"she said "hi""#]);
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let t = Table::from_rows(
            vec!["a".to_string(), "b".to_string()],
            vec![
                vec![Cell::Float(1.5), Cell::Str("x,y".into())],
                vec![Cell::Null, Cell::Bool(true)],
            ],
        )
        .unwrap();

        write_table(&path, &t).unwrap();
        let back = read_table(&path).unwrap();

        assert_eq!(back.column("a").unwrap().cells[0], Cell::Float(1.5));
        assert_eq!(back.column("b").unwrap().cells[0], Cell::Str("x,y".into()));
        assert_eq!(back.column("a").unwrap().cells[1], Cell::Null);
        assert_eq!(back.column("b").unwrap().cells[1], Cell::Bool(true));
    }

    #[test]
    fn test_write_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("y.csv");
        write_series(&path, "price", &arr1(&[1.0, 2.5])).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "price\n1\n2.5\n");
    }
}
