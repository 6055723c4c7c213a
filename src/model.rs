//! Ordinary least-squares linear regression.
//!
//! The feature count here is small (a handful of shuttle attributes), so the
//! normal equations with partial-pivot Gaussian elimination are plenty.

use anyhow::{bail, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A fitted linear regression model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Array1<f64>,
}

impl LinearModel {
    /// Fit by least squares with an intercept term.
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>) -> Result<Self> {
        let (n, p) = x.dim();
        if n != y.len() {
            bail!("feature matrix has {} rows but target has {} values", n, y.len());
        }
        if n < p + 1 {
            bail!("need at least {} observations to fit {} features, got {}", p + 1, p, n);
        }

        // Augment with a leading ones column for the intercept.
        let mut design = Array2::ones((n, p + 1));
        design.slice_mut(ndarray::s![.., 1..]).assign(x);

        // Normal equations: (XᵀX) β = Xᵀy
        let xt = design.t();
        let xtx = xt.dot(&design);
        let xty = xt.dot(y);

        let beta = solve(xtx, xty)?;
        Ok(Self {
            intercept: beta[0],
            coefficients: beta.slice(ndarray::s![1..]).to_owned(),
        })
    }

    /// Predict targets for a feature matrix.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (_, p) = x.dim();
        if p != self.coefficients.len() {
            bail!(
                "model was fit on {} features, matrix has {}",
                self.coefficients.len(),
                p
            );
        }
        Ok(x.dot(&self.coefficients) + self.intercept)
    }
}

/// Solve a square linear system by Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();

    for col in 0..n {
        // Pivot: largest magnitude on or below the diagonal.
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        if a[[pivot_row, col]].abs() < 1e-12 {
            bail!("singular system: features are collinear or constant");
        }
        if pivot_row != col {
            for k in 0..n {
                let tmp = a[[col, k]];
                a[[col, k]] = a[[pivot_row, k]];
                a[[pivot_row, k]] = tmp;
            }
            b.swap(col, pivot_row);
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    // Back substitution.
    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let mut acc = b[row];
        for k in (row + 1)..n {
            acc -= a[[row, k]] * x[k];
        }
        x[row] = acc / a[[row, row]];
    }
    Ok(x)
}
