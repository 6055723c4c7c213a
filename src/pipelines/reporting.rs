//! Reporting pipeline: summary tables derived from the preprocessed data.

use crate::catalog::Value;
use crate::data::{Cell, Table};
use crate::graph::{GraphError, Node, Pipeline};
use anyhow::Result;
use std::sync::Arc;

fn compare_passenger_capacity(inputs: &[Value]) -> Result<Vec<Value>> {
    let shuttles = inputs[0].as_table()?;
    let summary = shuttles.group_mean("shuttle_type", "passenger_capacity")?;
    Ok(vec![Value::Table(summary)])
}

/// Placeholder confusion matrix with fixed counts; stands in until a real
/// classifier lands in the project.
fn create_confusion_matrix(inputs: &[Value]) -> Result<Vec<Value>> {
    // Touch the input so the dependency on `companies` is honest.
    let companies = inputs[0].as_table()?;
    anyhow::ensure!(companies.n_rows() > 0, "companies table is empty");

    let matrix = Table::from_rows(
        vec![
            "actual".to_string(),
            "predicted_0".to_string(),
            "predicted_1".to_string(),
        ],
        vec![
            vec![Cell::Str("0".into()), Cell::Float(5.0), Cell::Float(1.0)],
            vec![Cell::Str("1".into()), Cell::Float(2.0), Cell::Float(4.0)],
        ],
    )?;
    Ok(vec![Value::Table(matrix)])
}

/// The reporting sub-pipeline.
pub fn create_pipeline() -> Result<Pipeline, GraphError> {
    Pipeline::new([
        Node::new(
            "compare_passenger_capacity_node",
            ["preprocessed_shuttles"],
            ["shuttle_passenger_capacity"],
            Arc::new(compare_passenger_capacity),
        ),
        Node::new(
            "create_confusion_matrix_node",
            ["companies"],
            ["dummy_confusion_matrix"],
            Arc::new(create_confusion_matrix),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::test_fixtures::raw_companies;

    #[test]
    fn test_capacity_summary_groups_by_type() {
        let shuttles = Table::from_rows(
            vec!["shuttle_type".to_string(), "passenger_capacity".to_string()],
            vec![
                vec![Cell::Str("Type F5".into()), Cell::Float(4.0)],
                vec![Cell::Str("Type V5".into()), Cell::Float(10.0)],
                vec![Cell::Str("Type F5".into()), Cell::Float(6.0)],
            ],
        )
        .unwrap();

        let out = compare_passenger_capacity(&[Value::Table(shuttles)]).unwrap();
        let summary = out[0].as_table().unwrap();

        assert_eq!(summary.n_rows(), 2);
        assert_eq!(
            summary.column_names(),
            vec!["shuttle_type", "mean_passenger_capacity"]
        );
        // First-appearance order: F5 then V5.
        assert_eq!(
            summary.column("mean_passenger_capacity").unwrap().cells[0],
            Cell::Float(5.0)
        );
    }

    #[test]
    fn test_confusion_matrix_shape() {
        let out = create_confusion_matrix(&[Value::Table(raw_companies())]).unwrap();
        let matrix = out[0].as_table().unwrap();
        assert_eq!(matrix.n_rows(), 2);
        assert_eq!(matrix.n_cols(), 3);
    }

    #[test]
    fn test_pipeline_shape() {
        let p = create_pipeline().unwrap();
        assert_eq!(p.len(), 2);
        assert!(p.free_inputs().contains("companies"));
        assert!(p.free_inputs().contains("preprocessed_shuttles"));
    }
}
