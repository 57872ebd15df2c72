//! Evaluation metrics
//!
//! Accuracy, log loss, and multi-class Brier score over predicted class
//! probabilities.

use std::fmt;

/// Evaluation results for one dataset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Metrics {
    pub accuracy: f64,
    pub log_loss: f64,
    /// Mean over classes of the one-vs-rest Brier score
    pub brier: f64,
    pub samples: usize,
}

/// Evaluate flattened `[n, n_classes]` probabilities against class indices.
pub fn evaluate(probs: &[f32], targets: &[usize], n_classes: usize) -> Metrics {
    let n = targets.len();
    if n == 0 || probs.len() != n * n_classes {
        return Metrics::default();
    }

    let eps = 1e-7f64;
    let mut correct = 0usize;
    let mut log_loss_sum = 0.0f64;
    let mut brier_sum = 0.0f64;

    for (i, &target) in targets.iter().enumerate() {
        let row = &probs[i * n_classes..(i + 1) * n_classes];
        let predicted = argmax(row);
        if predicted == target {
            correct += 1;
        }
        let p_true = (row[target] as f64).clamp(eps, 1.0 - eps);
        log_loss_sum -= p_true.ln();
        for (c, &p) in row.iter().enumerate() {
            let truth = if c == target { 1.0 } else { 0.0 };
            brier_sum += (p as f64 - truth).powi(2);
        }
    }

    Metrics {
        accuracy: correct as f64 / n as f64,
        log_loss: log_loss_sum / n as f64,
        brier: brier_sum / (n * n_classes) as f64,
        samples: n,
    }
}

/// Index of the largest value; first wins ties.
pub fn argmax(row: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }
    best
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accuracy={:.3} log_loss={:.3} brier={:.3} (n={})",
            self.accuracy, self.log_loss, self.brier, self.samples
        )
    }
}
