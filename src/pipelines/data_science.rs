//! Data-science pipeline: train/test split, regression fit, prediction
//! and evaluation on the model input table.

use crate::catalog::Value;
use crate::graph::{GraphError, Node, Pipeline};
use crate::metrics::{evaluate_regression, Report};
use crate::model::LinearModel;
use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;

fn split_data(inputs: &[Value]) -> Result<Vec<Value>> {
    let table = inputs[0].as_table()?;
    let options = inputs[1].as_params()?;

    let features = table.select(&options.features)?;
    let target = table.float_column("price")?;

    let n = table.n_rows();
    anyhow::ensure!(n >= 2, "need at least 2 rows to split, got {n}");

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(options.random_state);
    order.shuffle(&mut rng);

    let n_test = ((n as f64) * options.test_size).ceil() as usize;
    anyhow::ensure!(
        n_test > 0 && n_test < n,
        "test_size {} leaves an empty split for {n} rows",
        options.test_size
    );
    let (test_rows, train_rows) = order.split_at(n_test);

    let x_train = features.take_rows(train_rows);
    let x_test = features.take_rows(test_rows);
    let y_train = train_rows.iter().map(|&i| target[i]).collect();
    let y_test = test_rows.iter().map(|&i| target[i]).collect();

    Ok(vec![
        Value::Table(x_train),
        Value::Table(x_test),
        Value::Series(y_train),
        Value::Series(y_test),
    ])
}

fn train_model(inputs: &[Value]) -> Result<Vec<Value>> {
    let x_train = inputs[0].as_table()?.to_matrix()?;
    let y_train = inputs[1].as_series()?;

    let regressor = LinearModel::fit(&x_train, y_train)?;
    Ok(vec![Value::Model(regressor)])
}

fn predict(inputs: &[Value]) -> Result<Vec<Value>> {
    let regressor = inputs[0].as_model()?;
    let x_test = inputs[1].as_table()?.to_matrix()?;

    let predictions = regressor.predict(&x_test)?;
    Ok(vec![Value::Series(predictions)])
}

fn evaluate_model(inputs: &[Value]) -> Result<Vec<Value>> {
    let y_test = inputs[0].as_series()?;
    let predictions = inputs[1].as_series()?;

    let report = evaluate_regression(y_test, predictions)?;
    tracing::info!("Model evaluation: {report}");
    Ok(vec![Value::Report(Report::Regression(report))])
}

/// Training sub-pipeline: split the model input table and fit the regressor.
pub fn create_training_pipeline() -> Result<Pipeline, GraphError> {
    Pipeline::new([
        Node::new(
            "split_data_node",
            ["model_input_table", "params:model_options"],
            ["X_train", "X_test", "y_train", "y_test"],
            Arc::new(split_data),
        ),
        Node::new(
            "train_model_node",
            ["X_train", "y_train"],
            ["regressor"],
            Arc::new(train_model),
        ),
    ])
}

/// Inference sub-pipeline: predict and evaluate with an existing `regressor`.
///
/// `regressor`, `X_test` and `y_test` are free inputs, supplied through the
/// catalog by an earlier training run.
pub fn create_inference_pipeline() -> Result<Pipeline, GraphError> {
    Pipeline::new([
        Node::new(
            "predict_node",
            ["regressor", "X_test"],
            ["predictions"],
            Arc::new(predict),
        ),
        Node::new(
            "evaluate_model_node",
            ["y_test", "predictions"],
            ["metrics"],
            Arc::new(evaluate_model),
        ),
    ])
}
