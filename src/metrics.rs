//! Model evaluation: regression and classification reports.
//!
//! The variant is an explicit choice by the caller, not inferred from the
//! presence of an optional probabilities argument.

use anyhow::{bail, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An evaluation report, tagged by task kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    Regression(RegressionReport),
    Classification(ClassificationReport),
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Regression(r) => write!(f, "{r}"),
            Report::Classification(c) => write!(f, "{c}"),
        }
    }
}

/// Regression metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionReport {
    /// Coefficient of determination.
    pub r2: f64,
    /// Mean absolute error.
    pub mae: f64,
    /// Largest absolute residual.
    pub max_error: f64,
}

impl fmt::Display for RegressionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "r2={:.4}, mae={:.4}, max_error={:.4}",
            self.r2, self.mae, self.max_error
        )
    }
}

/// Classification metrics with weighted averaging across classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Binary ROC-AUC over the supplied scores.
    pub roc_auc: f64,
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accuracy={:.4}, precision={:.4}, recall={:.4}, f1={:.4}, roc_auc={:.4}",
            self.accuracy, self.precision, self.recall, self.f1, self.roc_auc
        )
    }
}

/// Compute regression metrics for predictions against true values.
pub fn evaluate_regression(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<RegressionReport> {
    check_lengths(y_true, y_pred)?;
    let n = y_true.len() as f64;

    let mean = y_true.mean().unwrap_or(0.0);
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    // Constant targets: perfect predictions score 1, anything else 0.
    let r2 = if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    };

    let residuals: Vec<f64> = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .collect();
    let mae = residuals.iter().sum::<f64>() / n;
    let max_error = residuals.iter().fold(0.0f64, |acc, r| acc.max(*r));

    Ok(RegressionReport { r2, mae, max_error })
}

/// Compute weighted classification metrics plus binary ROC-AUC.
///
/// Labels are compared exactly; `scores` are the positive-class scores used
/// for ROC-AUC and require exactly the label set {0, 1} in `y_true`.
pub fn evaluate_classification(
    y_true: &Array1<f64>,
    y_pred: &Array1<f64>,
    scores: &Array1<f64>,
) -> Result<ClassificationReport> {
    check_lengths(y_true, y_pred)?;
    check_lengths(y_true, scores)?;
    let n = y_true.len() as f64;

    let accuracy = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count() as f64
        / n;

    // Per-class counts keyed on the label's bit pattern (labels are discrete).
    let mut tp: BTreeMap<u64, f64> = BTreeMap::new();
    let mut fp: BTreeMap<u64, f64> = BTreeMap::new();
    let mut fn_: BTreeMap<u64, f64> = BTreeMap::new();
    let mut support: BTreeMap<u64, f64> = BTreeMap::new();
    let key = |v: f64| v.to_bits();

    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        *support.entry(key(*t)).or_default() += 1.0;
        if t == p {
            *tp.entry(key(*t)).or_default() += 1.0;
        } else {
            *fp.entry(key(*p)).or_default() += 1.0;
            *fn_.entry(key(*t)).or_default() += 1.0;
        }
    }

    let mut precision = 0.0;
    let mut recall = 0.0;
    let mut f1 = 0.0;
    for (&class, &sup) in &support {
        let tp_c = tp.get(&class).copied().unwrap_or(0.0);
        let fp_c = fp.get(&class).copied().unwrap_or(0.0);
        let fn_c = fn_.get(&class).copied().unwrap_or(0.0);

        let p_c = if tp_c + fp_c > 0.0 { tp_c / (tp_c + fp_c) } else { 0.0 };
        let r_c = if tp_c + fn_c > 0.0 { tp_c / (tp_c + fn_c) } else { 0.0 };
        let f_c = if p_c + r_c > 0.0 { 2.0 * p_c * r_c / (p_c + r_c) } else { 0.0 };

        let weight = sup / n;
        precision += weight * p_c;
        recall += weight * r_c;
        f1 += weight * f_c;
    }

    let roc_auc = roc_auc_binary(y_true, scores)?;

    Ok(ClassificationReport {
        accuracy,
        precision,
        recall,
        f1,
        roc_auc,
    })
}

/// Rank-based binary ROC-AUC (Mann-Whitney U), ties counted at half weight.
fn roc_auc_binary(y_true: &Array1<f64>, scores: &Array1<f64>) -> Result<f64> {
    let n_pos = y_true.iter().filter(|&&t| t == 1.0).count() as f64;
    let n_neg = y_true.iter().filter(|&&t| t == 0.0).count() as f64;
    if n_pos + n_neg < y_true.len() as f64 {
        bail!("ROC-AUC requires binary labels 0/1");
    }
    if n_pos == 0.0 || n_neg == 0.0 {
        bail!("ROC-AUC requires both classes to be present");
    }

    // Average ranks over the sorted scores, handling tied groups.
    let mut indexed: Vec<(f64, f64)> = scores
        .iter()
        .zip(y_true.iter())
        .map(|(&s, &t)| (s, t))
        .collect();
    indexed.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < indexed.len() {
        let mut j = i;
        while j < indexed.len() && indexed[j].0 == indexed[i].0 {
            j += 1;
        }
        // 1-based ranks i+1 ..= j averaged over the tied group.
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for item in &indexed[i..j] {
            if item.1 == 1.0 {
                rank_sum_pos += avg_rank;
            }
        }
        i = j;
    }

    Ok((rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

fn check_lengths(a: &Array1<f64>, b: &Array1<f64>) -> Result<()> {
    if a.len() != b.len() {
        bail!("length mismatch: {} vs {}", a.len(), b.len());
    }
    if a.is_empty() {
        bail!("cannot evaluate empty series");
    }
    Ok(())
}
