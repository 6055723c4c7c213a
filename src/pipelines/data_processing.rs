//! Data-processing pipeline: raw company/shuttle/review tables into the
//! model input table.

use crate::catalog::Value;
use crate::graph::{GraphError, Node, Pipeline};
use anyhow::Result;
use std::sync::Arc;

fn preprocess_companies(inputs: &[Value]) -> Result<Vec<Value>> {
    let mut table = inputs[0].as_table()?.clone();
    table.parse_percentage("company_rating")?;
    table.parse_bool("iata_approved")?;
    Ok(vec![Value::Table(table)])
}

fn preprocess_shuttles(inputs: &[Value]) -> Result<Vec<Value>> {
    let mut table = inputs[0].as_table()?.clone();
    table.parse_money("price")?;
    table.parse_bool("d_check_complete")?;
    table.parse_bool("moon_clearance_complete")?;
    Ok(vec![Value::Table(table)])
}

fn create_model_input_table(inputs: &[Value]) -> Result<Vec<Value>> {
    let shuttles = inputs[0].as_table()?;
    let companies = inputs[1].as_table()?;
    let reviews = inputs[2].as_table()?;

    let rated_shuttles = shuttles.inner_join(companies, "company_id", "id")?;
    let with_reviews = rated_shuttles.inner_join(reviews, "id", "shuttle_id")?;
    let model_input_table = with_reviews.drop_nulls();

    tracing::info!(
        "Model input table: {} rows, {} columns",
        model_input_table.n_rows(),
        model_input_table.n_cols()
    );
    Ok(vec![Value::Table(model_input_table)])
}

/// The data-processing sub-pipeline.
pub fn create_pipeline() -> Result<Pipeline, GraphError> {
    Pipeline::new([
        Node::new(
            "preprocess_companies_node",
            ["companies"],
            ["preprocessed_companies"],
            Arc::new(preprocess_companies),
        ),
        Node::new(
            "preprocess_shuttles_node",
            ["shuttles"],
            ["preprocessed_shuttles"],
            Arc::new(preprocess_shuttles),
        ),
        Node::new(
            "create_model_input_table_node",
            ["preprocessed_shuttles", "preprocessed_companies", "reviews"],
            ["model_input_table"],
            Arc::new(create_model_input_table),
        ),
    ])
}
